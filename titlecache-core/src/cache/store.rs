//! In-process cache backend with optional TTL and LRU eviction

use crate::cache::{
    config::MemoryCacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheMetrics, CacheValue},
    KvStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Process-local key/value cache
///
/// This implementation provides:
/// - Thread-safe async access via RwLock
/// - Optional TTL-based expiration
/// - LRU eviction once `max_entries` is reached
/// - Hit/miss metrics
pub struct MemoryStore {
    config: MemoryCacheConfig,

    /// Internal storage
    store: Arc<RwLock<Storage>>,
}

struct Storage {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, Slot>,

    /// LRU tracking: access order, stamped with the generation of the access
    ///
    /// A key is queued again on every access; older stamps for the same key
    /// are stale and skipped when popped.
    lru_queue: VecDeque<(CacheKey, u64)>,

    /// Stamp handed to the next access
    next_generation: u64,

    metrics: CacheMetrics,
}

struct Slot {
    entry: CacheEntry,
    /// Generation of the live `lru_queue` stamp for this key
    generation: u64,
}

impl Storage {
    fn insert(&mut self, key: &str, entry: CacheEntry) {
        self.metrics.size_bytes += entry.metadata.size_bytes;
        self.entries.insert(key.to_string(), Slot { entry, generation: 0 });
        self.touch(key);
    }

    fn remove(&mut self, key: &str) {
        if let Some(slot) = self.entries.remove(key) {
            self.metrics.size_bytes = self
                .metrics
                .size_bytes
                .saturating_sub(slot.entry.metadata.size_bytes);
        }
    }

    fn touch(&mut self, key: &str) {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(slot) = self.entries.get_mut(key) {
            slot.generation = generation;
            self.lru_queue.push_back((key.to_string(), generation));
        }
        self.compact_if_needed();
    }

    /// Least recently used live key
    fn pop_lru(&mut self) -> Option<CacheKey> {
        while let Some((key, generation)) = self.lru_queue.pop_front() {
            if self.is_live(&key, generation) {
                return Some(key);
            }
        }
        None
    }

    fn is_live(&self, key: &str, generation: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Drop stale stamps once they outnumber the live ones
    fn compact_if_needed(&mut self) {
        if self.lru_queue.len() <= 2 * self.entries.len() + COMPACT_SLACK {
            return;
        }
        let queue = std::mem::take(&mut self.lru_queue);
        self.lru_queue = queue
            .into_iter()
            .filter(|(key, generation)| self.is_live(key, *generation))
            .collect();
    }
}

const COMPACT_SLACK: usize = 1024;

impl MemoryStore {
    /// Create a new cache with the given configuration
    pub fn new(config: MemoryCacheConfig) -> Self {
        info!("Initializing memory cache with config: {:?}", config);

        Self {
            config,
            store: Arc::new(RwLock::new(Storage {
                entries: HashMap::new(),
                lru_queue: VecDeque::new(),
                next_generation: 0,
                metrics: CacheMetrics::default(),
            })),
        }
    }

    /// Get cache metrics
    pub async fn metrics(&self) -> CacheMetrics {
        let store = self.store.read().await;
        store.metrics.clone()
    }

    /// Get number of entries in cache
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    fn evict_if_needed(&self, store: &mut Storage) {
        while store.entries.len() >= self.config.max_entries {
            match store.pop_lru() {
                Some(key) => {
                    debug!("Evicting entry due to max_entries limit: {}", key);
                    store.remove(&key);
                    store.metrics.evictions_size += 1;
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let Some(slot) = store.entries.get_mut(key) else {
            debug!("Cache miss: {}", key);
            store.metrics.misses += 1;
            return Ok(None);
        };

        if slot.entry.is_expired() {
            debug!("Cache entry expired: {}", key);
            store.remove(key);
            store.metrics.misses += 1;
            store.metrics.evictions_ttl += 1;
            store.metrics.entries = store.entries.len();
            return Ok(None);
        }

        slot.entry.mark_accessed();
        let value = slot.entry.value.clone();
        store.metrics.hits += 1;
        store.touch(key);

        debug!("Cache hit: {}", key);
        Ok(Some(value))
    }

    async fn put(&self, key: &str, value: CacheValue) -> Result<()> {
        let entry = CacheEntry::new(key.to_string(), value, self.config.ttl_with_jitter());

        let mut guard = self.store.write().await;
        let store = &mut *guard;

        if store.entries.contains_key(key) {
            debug!("Replacing cache entry: {}", key);
            store.remove(key);
        } else {
            self.evict_if_needed(store);
        }

        store.insert(key, entry);
        store.metrics.entries = store.entries.len();

        Ok(())
    }
}
