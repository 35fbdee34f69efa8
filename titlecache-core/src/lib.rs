//! # RDF Title Cache (titlecache-core)
//!
//! A read-through cache mapping RDF resource URIs to a human-readable title,
//! filled from a SPARQL store and served from a key/value cache.
//!
//! ## Features
//!
//! - Whole-graph population with a fixed predicate priority list
//! - Language-aware title selection with default-language fallback
//! - Per-graph bookkeeping (creation, update and last lookup times)
//! - Pluggable triple stores (Virtuoso / SPARQL protocol, in-memory)
//! - Pluggable caches (in-memory with TTL and LRU, file-backed)
//! - Deadlines around every store query and cache operation
//!
//! ## Populate and Resolve
//!
//! ```no_run
//! use std::sync::Arc;
//! use titlecache_core::cache::{open_cache, CacheConfig};
//! use titlecache_core::store::{connect_store, StoreConfig};
//! use titlecache_core::title::{Populator, Resolver, TitlePredicateList};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = connect_store(&StoreConfig::default())?;
//!     let cache = open_cache(&CacheConfig::default())?;
//!     let graph = "http://example.org/";
//!
//!     let summary = Populator::new(store, cache.clone())
//!         .populate(graph, &TitlePredicateList::default(), "en")
//!         .await?;
//!     println!("Cached {} subjects", summary.counts);
//!
//!     let titles = Resolver::new(cache)
//!         .resolve(graph, &["http://example.org/1".to_string()], "de", "en")
//!         .await?;
//!     println!("{:?}", titles);
//!     Ok(())
//! }
//! ```
//!
//! ## Action Envelopes
//!
//! Front ends go through [`TitleCache`], which always answers with a
//! `{status, data, message}` [`Envelope`]:
//!
//! ```no_run
//! use titlecache_core::{ActionRequest, TitleCache, TitleCacheConfig};
//!
//! # async fn example() {
//! let service = TitleCache::new(TitleCacheConfig::default());
//! let envelope = service
//!     .run(ActionRequest::new("get").with_uris(["http://example.org/1"]).with_lang("de"))
//!     .await;
//! println!("{}", serde_json::to_string(&envelope).unwrap());
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod title;

// Re-export main types for convenience
pub use cache::{open_cache, CacheConfig, KvStore};
pub use config::{TitleCacheConfig, TitleCacheConfigBuilder};
pub use error::{Result, TitleCacheError};
pub use service::{Action, ActionRequest, Envelope, Status, TitleCache};
pub use store::{
    connect_store, HealthCheckResult, HealthStatus, RdfTerm, StoreConfig, TitleQuery,
    TripleRow, TripleStoreClient,
};
pub use title::{
    GraphStats, PopulateSummary, Populator, ResolvedTitles, Resolver, StatsChange,
    SubjectTitleEntry, TitleCandidate, TitlePredicateList,
};
