//! # Key/Value Cache Backends
//!
//! The title cache only needs per-key `get` and `put` from its storage: no
//! deletion, no scans, no multi-key transactions. [`KvStore`] is that
//! capability; each backend implements it and [`open_cache`] picks one from
//! a [`CacheConfig`].
//!
//! ## Backends
//!
//! - `memory`: process-local map with optional TTL and LRU eviction
//! - `file`: one file per key under a directory, atomic per-key replace
//!
//! ## Example
//!
//! ```rust
//! use titlecache_core::cache::{open_cache, CacheConfig};
//!
//! # async fn example() -> titlecache_core::Result<()> {
//! let cache = open_cache(&CacheConfig::default())?;
//!
//! cache.put("graph.subject", "{\"titles\":[]}".to_string()).await?;
//! if let Some(value) = cache.get("graph.subject").await? {
//!     println!("Cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod file;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder, FileCacheConfig, MemoryCacheConfig};
pub use entry::{CacheEntry, CacheMetadata};
pub use file::FileStore;
pub use store::MemoryStore;
pub use types::{stats_key, subject_key, CacheKey, CacheMetrics, CacheValue};

use crate::error::{Result, TitleCacheError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-key storage consumed by the populator and resolver
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend identifier reported in summaries
    fn name(&self) -> &str;

    /// Read the value at `key`
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Replace the value at `key`
    async fn put(&self, key: &str, value: CacheValue) -> Result<()>;
}

/// Wraps a backend so every operation is bounded by a deadline
pub struct TimedKvStore {
    inner: Arc<dyn KvStore>,
    timeout: Duration,
}

impl TimedKvStore {
    pub fn new(inner: Arc<dyn KvStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl KvStore for TimedKvStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        tokio::time::timeout(self.timeout, self.inner.get(key))
            .await
            .map_err(|_| TitleCacheError::cache_timeout(self.timeout, &format!("get {}", key)))?
    }

    async fn put(&self, key: &str, value: CacheValue) -> Result<()> {
        tokio::time::timeout(self.timeout, self.inner.put(key, value))
            .await
            .map_err(|_| TitleCacheError::cache_timeout(self.timeout, &format!("put {}", key)))?
    }
}

/// Open the backend named by `config.backend`
pub fn open_cache(config: &CacheConfig) -> Result<Arc<dyn KvStore>> {
    config.validate().map_err(TitleCacheError::ConfigError)?;

    let backend: Arc<dyn KvStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryStore::new(config.memory.clone())),
        "file" => Arc::new(FileStore::open(&config.file.path)?),
        other => return Err(TitleCacheError::UnknownCacheBackend(other.to_string())),
    };

    info!("Opened {} cache backend", backend.name());
    Ok(Arc::new(TimedKvStore::new(backend, config.io_timeout())))
}
