//! Configuration for triple store backends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Store backend selection and per-backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend name: `virtuoso`, `sparql` or `memory`
    pub backend: String,

    /// Virtuoso SPARQL endpoint
    pub virtuoso: SparqlEndpointConfig,

    /// Any other SPARQL 1.1 protocol endpoint
    pub sparql: SparqlEndpointConfig,

    /// In-process store
    pub memory: MemoryStoreConfig,

    /// Deadline for one store query, in milliseconds
    pub query_timeout_ms: u64,

    /// Health checks slower than this report `degraded`
    pub degraded_threshold_ms: u64,
}

/// SPARQL protocol endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparqlEndpointConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// In-process store settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// JSON file of quads loaded when the store is opened
    pub data: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "virtuoso".to_string(),
            virtuoso: SparqlEndpointConfig {
                endpoint: "http://localhost:8890/sparql".to_string(),
                username: Some("dba".to_string()),
                password: Some("dba".to_string()),
            },
            sparql: SparqlEndpointConfig::default(),
            memory: MemoryStoreConfig::default(),
            query_timeout_ms: 30_000,
            degraded_threshold_ms: 1_000,
        }
    }
}

impl Default for SparqlEndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8890/sparql".to_string(),
            username: None,
            password: None,
        }
    }
}

impl StoreConfig {
    /// Deadline for one store query
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.trim().is_empty() {
            return Err("store backend must not be empty".to_string());
        }

        if self.query_timeout_ms == 0 {
            return Err("query_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Identity of the client this config opens, used to share instances
    pub fn fingerprint(&self) -> String {
        match self.backend.as_str() {
            "virtuoso" => format!("virtuoso:{}", self.virtuoso.endpoint),
            "sparql" => format!("sparql:{}", self.sparql.endpoint),
            "memory" => format!("memory:{:?}", self.memory.data),
            other => other.to_string(),
        }
    }
}
