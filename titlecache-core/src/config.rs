//! Title cache configuration
//!
//! A [`TitleCacheConfig`] is built once per invocation and handed by
//! reference to the populator and resolver. Per-request settings are merged
//! into a copy of the defaults with [`TitleCacheConfig::merged`]; the
//! defaults themselves are never mutated.

use crate::cache::CacheConfig;
use crate::error::{Result, TitleCacheError};
use crate::store::{check_iri, StoreConfig};
use crate::title::TitlePredicateList;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Complete configuration of one title cache invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleCacheConfig {
    /// Graph used when a request names none
    pub graph: String,

    /// Language served when a request names none, and the fallback language
    pub default_lang: String,

    /// Title predicates, highest priority first
    pub predicates: TitlePredicateList,

    pub store: StoreConfig,

    pub cache: CacheConfig,
}

impl Default for TitleCacheConfig {
    fn default() -> Self {
        Self {
            graph: "http://example.org/".to_string(),
            default_lang: "en".to_string(),
            predicates: TitlePredicateList::default(),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl TitleCacheConfig {
    /// Create a new builder starting from the defaults
    pub fn builder() -> TitleCacheConfigBuilder {
        TitleCacheConfigBuilder {
            config: TitleCacheConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.graph.trim().is_empty() {
            return Err(TitleCacheError::ConfigError("graph must not be empty".to_string()));
        }

        if self.default_lang.trim().is_empty() {
            return Err(TitleCacheError::ConfigError(
                "default_lang must not be empty".to_string(),
            ));
        }

        if self.predicates.is_empty() {
            return Err(TitleCacheError::ConfigError(
                "at least one title predicate is required".to_string(),
            ));
        }

        for iri in std::iter::once(&self.graph).chain(self.predicates.iter()) {
            check_iri(iri).map_err(|e| match e {
                TitleCacheError::StoreError(message) => TitleCacheError::ConfigError(message),
                other => other,
            })?;
        }

        self.store.validate().map_err(TitleCacheError::ConfigError)?;
        self.cache.validate().map_err(TitleCacheError::ConfigError)?;
        Ok(())
    }

    /// Copy of `self` with `overrides` merged in
    ///
    /// Objects merge key by key at every depth; any other value (including
    /// lists) replaces the default wholesale. `null` leaves the default.
    pub fn merged(&self, overrides: &Value) -> Result<Self> {
        if overrides.is_null() {
            return Ok(self.clone());
        }

        let mut base = serde_json::to_value(self)?;
        merge_values(&mut base, overrides);
        let config: TitleCacheConfig = serde_json::from_value(base)
            .map_err(|e| TitleCacheError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a YAML file, which may be partial
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        Self::default().with_yaml_file(path)
    }

    /// `self` overlaid with a YAML file, which may be partial
    pub fn with_yaml_file(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TitleCacheError::ConfigError(format!("Unable to open file: {} ({})", path.display(), e))
        })?;
        let overrides: Value = serde_yaml::from_str(&content)?;
        debug!("Loaded configuration from {:?}", path);
        self.merged(&overrides)
    }

    /// Overlay `TITLECACHE_*` environment variables (and a `.env` file)
    pub fn with_env(self) -> Result<Self> {
        dotenv::dotenv().ok();
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Overlay variables looked up through `lookup`
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(graph) = lookup("TITLECACHE_GRAPH") {
            self.graph = graph;
        }
        if let Some(lang) = lookup("TITLECACHE_DEFAULT_LANG") {
            self.default_lang = lang;
        }
        if let Some(backend) = lookup("TITLECACHE_STORE_BACKEND") {
            self.store.backend = backend;
        }
        if let Some(endpoint) = lookup("TITLECACHE_SPARQL_ENDPOINT") {
            self.store.virtuoso.endpoint = endpoint.clone();
            self.store.sparql.endpoint = endpoint;
        }
        if let Some(user) = lookup("TITLECACHE_SPARQL_USER") {
            self.store.virtuoso.username = Some(user.clone());
            self.store.sparql.username = Some(user);
        }
        if let Some(password) = lookup("TITLECACHE_SPARQL_PASSWORD") {
            self.store.virtuoso.password = Some(password.clone());
            self.store.sparql.password = Some(password);
        }
        if let Some(timeout) = lookup("TITLECACHE_QUERY_TIMEOUT_MS") {
            self.store.query_timeout_ms = timeout.parse().map_err(|_| {
                TitleCacheError::ConfigError(format!(
                    "TITLECACHE_QUERY_TIMEOUT_MS is not a number: {}",
                    timeout
                ))
            })?;
        }
        if let Some(backend) = lookup("TITLECACHE_CACHE_BACKEND") {
            self.cache.backend = backend;
        }
        if let Some(path) = lookup("TITLECACHE_CACHE_PATH") {
            self.cache.file.path = path.into();
        }

        self.validate()?;
        Ok(self)
    }
}

fn merge_values(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overrides) => *base = overrides.clone(),
    }
}

/// Builder for [`TitleCacheConfig`]
#[derive(Debug)]
pub struct TitleCacheConfigBuilder {
    config: TitleCacheConfig,
}

impl TitleCacheConfigBuilder {
    pub fn graph(mut self, graph: impl Into<String>) -> Self {
        self.config.graph = graph.into();
        self
    }

    pub fn default_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.default_lang = lang.into();
        self
    }

    pub fn predicates(mut self, predicates: TitlePredicateList) -> Self {
        self.config.predicates = predicates;
        self
    }

    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn build(self) -> TitleCacheConfig {
        self.config
    }
}
