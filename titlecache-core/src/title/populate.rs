//! Whole-graph cache population

use crate::cache::{subject_key, KvStore};
use crate::error::{Result, TitleCacheError};
use crate::store::{TitleQuery, TripleStoreClient};
use crate::title::model::{rank, SubjectTitleEntry, TitleCandidate};
use crate::title::stats::{record_populate, StatsChange};
use crate::title::TitlePredicateList;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one populate pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulateSummary {
    /// Store backend the titles were read from
    pub backend: String,
    /// Cache backend the entries were written to
    pub cache: String,
    pub graph: String,
    pub default_lang: String,
    /// Highest-priority title predicate
    pub default_title_uri: String,
    /// Wall time of the pass, e.g. `"0.0421 seconds"`
    pub duration: String,
    /// Subjects written
    pub counts: usize,
    #[serde(skip, default = "default_change")]
    pub change: StatsChange,
}

fn default_change() -> StatsChange {
    StatsChange::Created
}

/// Rebuilds the title entries of a graph from the store
pub struct Populator {
    store: Arc<dyn TripleStoreClient>,
    cache: Arc<dyn KvStore>,
}

impl Populator {
    pub fn new(store: Arc<dyn TripleStoreClient>, cache: Arc<dyn KvStore>) -> Self {
        Self { store, cache }
    }

    /// Replace every title entry of `graph` and refresh its statistics
    ///
    /// Nothing is written until the store has answered and all entries are
    /// built, so a failing store leaves the previous cache contents intact.
    /// The statistics record is written last.
    pub async fn populate(
        &self,
        graph: &str,
        predicates: &TitlePredicateList,
        default_lang: &str,
    ) -> Result<PopulateSummary> {
        let start = Instant::now();
        let query = TitleQuery::new(graph, predicates.clone());
        query.validate()?;
        info!("Populating title cache for <{}> from {}", graph, self.store.name());

        if !self.store.ask(graph).await? {
            return Err(TitleCacheError::GraphNotFound(graph.to_string()));
        }

        let rows = self
            .store
            .select_titles(&query)
            .await?;
        let row_count = rows.len();

        // group literal objects by subject, remembering first-seen order
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<TitleCandidate>> = HashMap::new();
        for row in rows {
            if !row.object.is_literal() {
                continue;
            }
            let candidate =
                TitleCandidate::new(row.predicate, row.object.value(), row.object.language());
            grouped
                .entry(row.subject.clone())
                .or_insert_with(|| {
                    order.push(row.subject);
                    Vec::new()
                })
                .push(candidate);
        }

        let ranks = predicates.rank_map();
        let mut encoded: Vec<(String, String)> = Vec::with_capacity(order.len());
        for subject in order {
            let candidates = grouped.remove(&subject).unwrap_or_default();
            let titles = rank(candidates, &ranks);
            if titles.is_empty() {
                continue;
            }
            let value = serde_json::to_string(&SubjectTitleEntry::new(titles))?;
            encoded.push((subject_key(graph, &subject), value));
        }

        debug!(
            "<{}>: {} rows grouped into {} subjects",
            graph,
            row_count,
            encoded.len()
        );

        let counts = encoded.len();
        for (key, value) in encoded {
            self.cache.put(&key, value).await?;
        }

        let (_, change) =
            record_populate(self.cache.as_ref(), graph, self.store.name(), counts).await?;

        let elapsed = start.elapsed();
        info!(
            "Title cache for <{}> {}: {} subjects in {:?}",
            graph, change, counts, elapsed
        );

        Ok(PopulateSummary {
            backend: self.store.name().to_string(),
            cache: self.cache.name().to_string(),
            graph: graph.to_string(),
            default_lang: default_lang.to_string(),
            default_title_uri: predicates.primary().unwrap_or_default().to_string(),
            duration: format!("{:.4} seconds", elapsed.as_secs_f64()),
            counts,
            change,
        })
    }
}
