//! Batch title lookup

use crate::cache::{subject_key, KvStore};
use crate::error::{Result, TitleCacheError};
use crate::title::model::SubjectTitleEntry;
use crate::title::stats::{load_stats, touch_asked};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Requested URI -> chosen title, `None` when the subject has no entry
pub type ResolvedTitles = BTreeMap<String, Option<String>>;

/// Serves titles from a populated cache
pub struct Resolver {
    cache: Arc<dyn KvStore>,
}

impl Resolver {
    pub fn new(cache: Arc<dyn KvStore>) -> Self {
        Self { cache }
    }

    /// Look up the title of every subject in `subjects`
    ///
    /// Fails as a whole when the list is empty or the graph was never
    /// populated. Individual subjects without an entry map to `None`.
    pub async fn resolve(
        &self,
        graph: &str,
        subjects: &[String],
        lang: &str,
        default_lang: &str,
    ) -> Result<ResolvedTitles> {
        if subjects.is_empty() {
            return Err(TitleCacheError::NoUrisGiven);
        }

        let Some(stats) = load_stats(self.cache.as_ref(), graph).await? else {
            return Err(TitleCacheError::GraphNotCached(graph.to_string()));
        };
        touch_asked(self.cache.as_ref(), stats).await;

        let mut titles = ResolvedTitles::new();
        for subject in subjects {
            let title = match self.load_entry(graph, subject).await? {
                Some(entry) => entry.choose(lang, default_lang).map(str::to_string),
                None => None,
            };
            titles.insert(subject.clone(), title);
        }

        debug!(
            "Resolved {} of {} subjects in <{}> (lang {}, default {})",
            titles.values().filter(|t| t.is_some()).count(),
            titles.len(),
            graph,
            lang,
            default_lang
        );
        Ok(titles)
    }

    async fn load_entry(&self, graph: &str, subject: &str) -> Result<Option<SubjectTitleEntry>> {
        let Some(raw) = self.cache.get(&subject_key(graph, subject)).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!("Ignoring unreadable title entry for <{}>: {}", subject, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{stats_key, CacheValue, MemoryCacheConfig, MemoryStore};
    use crate::title::stats::{save_stats, GraphStats};
    use crate::title::TitleCandidate;
    use async_trait::async_trait;

    const GRAPH: &str = "http://example.org/";
    const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";

    async fn seeded_cache() -> Arc<MemoryStore> {
        let cache = Arc::new(MemoryStore::new(MemoryCacheConfig::default()));
        save_stats(cache.as_ref(), &GraphStats::created(GRAPH, "memory", 1, 1))
            .await
            .unwrap();
        let entry = SubjectTitleEntry::new(vec![TitleCandidate::new(DC_TITLE, "Hello", Some("en"))]);
        cache
            .put(
                &subject_key(GRAPH, "http://example.org/s"),
                serde_json::to_string(&entry).unwrap(),
            )
            .await
            .unwrap();
        cache
    }

    /// Rejects writes to the statistics key
    struct ReadOnlyStats(Arc<MemoryStore>);

    #[async_trait]
    impl KvStore for ReadOnlyStats {
        fn name(&self) -> &str {
            "read-only-stats"
        }

        async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
            self.0.get(key).await
        }

        async fn put(&self, key: &str, value: CacheValue) -> Result<()> {
            if key == stats_key(GRAPH) {
                return Err(TitleCacheError::CacheError("read-only".to_string()));
            }
            self.0.put(key, value).await
        }
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let resolver = Resolver::new(seeded_cache().await);
        let err = resolver.resolve(GRAPH, &[], "en", "en").await.unwrap_err();
        assert_eq!(err, TitleCacheError::NoUrisGiven);
    }

    #[tokio::test]
    async fn test_missing_subject_is_none() {
        let resolver = Resolver::new(seeded_cache().await);
        let titles = resolver
            .resolve(
                GRAPH,
                &["http://example.org/s".to_string(), "http://example.org/x".to_string()],
                "en",
                "en",
            )
            .await
            .unwrap();

        assert_eq!(titles["http://example.org/s"], Some("Hello".to_string()));
        assert_eq!(titles["http://example.org/x"], None);
    }

    #[tokio::test]
    async fn test_asked_time_is_stamped() {
        let cache = seeded_cache().await;
        let resolver = Resolver::new(cache.clone());

        resolver
            .resolve(GRAPH, &["http://example.org/s".to_string()], "en", "en")
            .await
            .unwrap();

        let stats = load_stats(cache.as_ref(), GRAPH).await.unwrap().unwrap();
        assert!(stats.asked_time.is_some());
        assert_eq!(stats.created_time, 1);
    }

    #[tokio::test]
    async fn test_failed_stats_touch_does_not_fail_lookup() {
        let cache = seeded_cache().await;
        let resolver = Resolver::new(Arc::new(ReadOnlyStats(cache)));

        let titles = resolver
            .resolve(GRAPH, &["http://example.org/s".to_string()], "de", "en")
            .await
            .unwrap();
        assert_eq!(titles["http://example.org/s"], Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_none() {
        let cache = seeded_cache().await;
        cache
            .put(&subject_key(GRAPH, "http://example.org/bad"), "not json".to_string())
            .await
            .unwrap();

        let titles = Resolver::new(cache)
            .resolve(GRAPH, &["http://example.org/bad".to_string()], "en", "en")
            .await
            .unwrap();
        assert_eq!(titles["http://example.org/bad"], None);
    }
}
