//! In-memory cache entry with optional TTL

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cache entry held by the in-process backend
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires, if ever
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Size of the entry in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Create a new cache entry, never expiring when `ttl` is `None`
    pub fn new(key: CacheKey, value: CacheValue, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let expires_at = ttl.map(|ttl| {
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3600))
        });
        let size_bytes = key.len() + value.len() + std::mem::size_of::<CacheMetadata>();

        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
                size_bytes,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.metadata
            .expires_at
            .map(|expires_at| Utc::now() > expires_at)
            .unwrap_or(false)
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }
}
