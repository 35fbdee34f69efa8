//! Per-graph bookkeeping stored next to the title entries

use crate::cache::{stats_key, KvStore};
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Statistics record of one populated graph
///
/// Timestamps are unix seconds. `updated_time` is 0 until the graph is
/// populated a second time; `asked_time` is absent until the first lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of subjects with a title entry
    pub counts: usize,
    pub created_time: i64,
    pub updated_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asked_time: Option<i64>,
    /// Graph identifier
    pub uri: String,
    /// Store backend that produced the entries
    pub store: String,
}

/// Whether a populate created the statistics record or refreshed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsChange {
    Created,
    Updated,
}

impl fmt::Display for StatsChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsChange::Created => write!(f, "created"),
            StatsChange::Updated => write!(f, "updated"),
        }
    }
}

impl GraphStats {
    /// Record for a graph populated for the first time
    pub fn created(graph: &str, store: &str, counts: usize, now: i64) -> Self {
        Self {
            counts,
            created_time: now,
            updated_time: 0,
            asked_time: None,
            uri: graph.to_string(),
            store: store.to_string(),
        }
    }

    /// Record after a repeated populate; creation and lookup times survive
    pub fn refreshed(mut self, store: &str, counts: usize, now: i64) -> Self {
        self.counts = counts;
        self.updated_time = now;
        self.store = store.to_string();
        self
    }

    /// Record after a lookup batch
    pub fn asked(mut self, now: i64) -> Self {
        self.asked_time = Some(now);
        self
    }
}

/// Current unix time in seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Read the statistics of `graph`, if it was ever populated
pub async fn load_stats(cache: &dyn KvStore, graph: &str) -> Result<Option<GraphStats>> {
    let Some(raw) = cache.get(&stats_key(graph)).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write the statistics record of `stats.uri`
pub async fn save_stats(cache: &dyn KvStore, stats: &GraphStats) -> Result<()> {
    cache
        .put(&stats_key(&stats.uri), serde_json::to_string(stats)?)
        .await
}

/// Create or refresh the statistics after a completed populate pass
pub async fn record_populate(
    cache: &dyn KvStore,
    graph: &str,
    store: &str,
    counts: usize,
) -> Result<(GraphStats, StatsChange)> {
    let now = unix_now();
    let (stats, change) = match load_stats(cache, graph).await? {
        Some(existing) => (existing.refreshed(store, counts, now), StatsChange::Updated),
        None => (GraphStats::created(graph, store, counts, now), StatsChange::Created),
    };

    save_stats(cache, &stats).await?;
    debug!("Graph stats for <{}> {}: {} subjects", graph, change, counts);
    Ok((stats, change))
}

/// Stamp `asked_time` on an existing record; failures are logged only
pub async fn touch_asked(cache: &dyn KvStore, stats: GraphStats) {
    let graph = stats.uri.clone();
    if let Err(e) = save_stats(cache, &stats.asked(unix_now())).await {
        warn!("Failed to update asked_time for <{}>: {}", graph, e);
    }
}
