//! Error types for title cache operations
//!
//! Every failure the populate and resolve paths can produce is a variant of
//! [`TitleCacheError`]. Errors are returned as values and rendered into the
//! `{status, data, message}` envelope by the service layer; nothing here is
//! retried automatically.

use std::time::Duration;
use thiserror::Error;

/// Main error type for title cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TitleCacheError {
    /// Request carried no action
    #[error("No or empty action paramter given")]
    NoActionGiven,

    /// Request carried an action other than `get` or `create`
    #[error("Unknown action paramter \"{0}\" given. Try \"get\" or \"create\".")]
    UnknownAction(String),

    /// Configured cache backend has no implementation
    #[error("Unknown cache backend type \"{0}\"")]
    UnknownCacheBackend(String),

    /// Configured store backend has no implementation
    #[error("Unknown store backend type \"{0}\"")]
    UnknownStoreBackend(String),

    /// Store client could not be constructed
    #[error("Store \"{0}\" initiating failed. May wrong config or your store is not running...?")]
    StoreInitError(String),

    /// The store holds no triples for the graph
    #[error("Cannot create the cache: graph \"{0}\" does not exists in your store. Choose another graph or create it in your store.")]
    GraphNotFound(String),

    /// Resolve requested for a graph that was never populated
    #[error("Cannot get the cache for graph \"{0}\". It does not exists. Choose another graph or create the cache first by calling: action=create&graph={0}")]
    GraphNotCached(String),

    /// Resolve requested with an empty URI list
    #[error("No uris given. Add some uri comma-seperated like: \"?action=get&uris=http://your-uri-1.org,http://your-uri-2.org\"")]
    NoUrisGiven,

    /// Query execution or transport failure against the triple store
    #[error("Store error: {0}")]
    StoreError(String),

    /// I/O failure against the cache backend
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TitleCacheError {
    /// Store operation exceeded its deadline
    pub fn store_timeout(timeout: Duration, context: &str) -> Self {
        TitleCacheError::StoreError(format!(
            "operation timed out after {}ms: {}",
            timeout.as_millis(),
            context
        ))
    }

    /// Cache operation exceeded its deadline
    pub fn cache_timeout(timeout: Duration, context: &str) -> Self {
        TitleCacheError::CacheError(format!(
            "operation timed out after {}ms: {}",
            timeout.as_millis(),
            context
        ))
    }
}

/// Result type alias for title cache operations
pub type Result<T> = std::result::Result<T, TitleCacheError>;

impl From<serde_json::Error> for TitleCacheError {
    fn from(e: serde_json::Error) -> Self {
        TitleCacheError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for TitleCacheError {
    fn from(e: serde_yaml::Error) -> Self {
        TitleCacheError::ConfigError(e.to_string())
    }
}
