//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - string-based, namespaced per graph
pub type CacheKey = String;

/// Cache value type - stores JSON-serialized records
pub type CacheValue = String;

/// Prefix that separates graph statistics from subject entries
pub const STATS_KEY_PREFIX: &str = "__TitleCacheFor:";

/// Key of the title entry for `subject` inside `graph`
///
/// The graph is length-prefixed so no pair of graph and subject can produce
/// the key of another pair.
pub fn subject_key(graph: &str, subject: &str) -> CacheKey {
    format!("{}:{}.{}", graph.len(), graph, subject)
}

/// Key of the statistics record for `graph`
pub fn stats_key(graph: &str) -> CacheKey {
    format!("{}{}", STATS_KEY_PREFIX, graph)
}

/// Hit/miss counters kept by in-process backends
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheMetrics {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Number of entries currently in cache
    pub entries: usize,

    /// Total size of cached data in bytes
    pub size_bytes: usize,

    /// Number of evictions due to the entry limit
    pub evictions_size: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,
}

impl CacheMetrics {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_size + self.evictions_ttl
    }
}

impl fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheMetrics {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, size: {} bytes, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.size_bytes,
            self.total_evictions()
        )
    }
}
