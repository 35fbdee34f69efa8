//! In-process quad store

use crate::error::{Result, TitleCacheError};
use crate::store::{RdfTerm, TitleQuery, TripleRow, TripleStoreClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

/// A triple inside a named graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    pub graph: String,
    pub subject: String,
    pub predicate: String,
    pub object: RdfTerm,
}

impl Quad {
    pub fn new(
        graph: impl Into<String>,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: RdfTerm,
    ) -> Self {
        Self {
            graph: graph.into(),
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

/// Triple store held in memory, returning rows in insertion order
#[derive(Default)]
pub struct MemoryTripleStore {
    quads: RwLock<Vec<Quad>>,
}

impl MemoryTripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quads(quads: Vec<Quad>) -> Self {
        Self {
            quads: RwLock::new(quads),
        }
    }

    /// Load a JSON array of quads
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TitleCacheError::StoreInitError(format!("memory ({}: {})", path.display(), e))
        })?;
        let quads: Vec<Quad> = serde_json::from_str(&content).map_err(|e| {
            TitleCacheError::StoreInitError(format!("memory ({}: {})", path.display(), e))
        })?;

        debug!("Loaded {} quads from {:?}", quads.len(), path);
        Ok(Self::with_quads(quads))
    }

    pub async fn insert(&self, quad: Quad) {
        self.quads.write().await.push(quad);
    }

    /// Drop every triple of `graph`
    pub async fn clear_graph(&self, graph: &str) {
        self.quads.write().await.retain(|q| q.graph != graph);
    }

    pub async fn len(&self) -> usize {
        self.quads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quads.read().await.is_empty()
    }
}

#[async_trait]
impl TripleStoreClient for MemoryTripleStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ask(&self, graph: &str) -> Result<bool> {
        Ok(self.quads.read().await.iter().any(|q| q.graph == graph))
    }

    async fn select_titles(&self, query: &TitleQuery) -> Result<Vec<TripleRow>> {
        let wanted: HashSet<&str> = query.predicates.iter().map(String::as_str).collect();
        let quads = self.quads.read().await;

        Ok(quads
            .iter()
            .filter(|q| q.graph == query.graph && wanted.contains(q.predicate.as_str()))
            .map(|q| TripleRow {
                subject: q.subject.clone(),
                predicate: q.predicate.clone(),
                object: q.object.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
