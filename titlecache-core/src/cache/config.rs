//! Configuration for the cache backends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Cache backend selection and per-backend settings
///
/// Only the section matching `backend` is consulted when the cache is
/// opened; the others keep their defaults so a request can switch backend
/// without restating every setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend name: `memory` or `file`
    pub backend: String,

    /// Settings for the in-process backend
    pub memory: MemoryCacheConfig,

    /// Settings for the file-backed backend
    pub file: FileCacheConfig,

    /// Deadline for a single get/put, in milliseconds
    pub io_timeout_ms: u64,
}

/// In-process cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries before LRU eviction kicks in
    pub max_entries: usize,

    /// Time-to-live for entries; `None` keeps them until evicted
    pub default_ttl_secs: Option<u64>,

    /// TTL jitter factor (0.0 - 1.0), spreads expiry of a bulk populate
    pub ttl_jitter: f64,
}

/// File-backed cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    /// Directory holding one file per key
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            memory: MemoryCacheConfig::default(),
            file: FileCacheConfig::default(),
            io_timeout_ms: 5_000,
        }
    }
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000_000,
            default_ttl_secs: None,
            ttl_jitter: 0.0,
        }
    }
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/titlecache"),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.trim().is_empty() {
            return Err("cache backend must not be empty".to_string());
        }

        if self.memory.max_entries == 0 {
            return Err("memory.max_entries must be greater than 0".to_string());
        }

        if self.memory.ttl_jitter < 0.0 || self.memory.ttl_jitter > 1.0 {
            return Err("memory.ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        if self.io_timeout_ms == 0 {
            return Err("io_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Deadline for a single cache operation
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Identity of the backend this config opens, used to share instances
    pub fn fingerprint(&self) -> String {
        match self.backend.as_str() {
            "memory" => format!(
                "memory:{}:{:?}",
                self.memory.max_entries, self.memory.default_ttl_secs
            ),
            "file" => format!("file:{}", self.file.path.display()),
            other => other.to_string(),
        }
    }
}

impl MemoryCacheConfig {
    /// Calculate actual TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Option<Duration> {
        let base = Duration::from_secs(self.default_ttl_secs?);
        if self.ttl_jitter == 0.0 {
            return Some(base);
        }

        let base_secs = base.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Some(Duration::from_secs_f64(final_secs))
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    backend: Option<String>,
    max_entries: Option<usize>,
    default_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    path: Option<PathBuf>,
    io_timeout: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Set the backend name
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Set maximum number of in-memory entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set TTL for in-memory entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Set the directory of the file backend
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the per-operation deadline
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            backend: self.backend.unwrap_or(defaults.backend),
            memory: MemoryCacheConfig {
                max_entries: self.max_entries.unwrap_or(defaults.memory.max_entries),
                default_ttl_secs: self
                    .default_ttl
                    .map(|ttl| ttl.as_secs().max(1))
                    .or(defaults.memory.default_ttl_secs),
                ttl_jitter: self.ttl_jitter.unwrap_or(defaults.memory.ttl_jitter),
            },
            file: FileCacheConfig {
                path: self.path.unwrap_or(defaults.file.path),
            },
            io_timeout_ms: self
                .io_timeout
                .map(|t| t.as_millis() as u64)
                .unwrap_or(defaults.io_timeout_ms),
        }
    }
}
