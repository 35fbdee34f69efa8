//! # Triple Store Clients
//!
//! The populator needs two things from an RDF store: whether a named graph
//! holds any triples, and the triples of that graph whose predicate is one of
//! the title predicates. [`TripleStoreClient`] is that capability.
//!
//! [`TitleQuery`] owns the query text (graph scoping and the predicate
//! filter); clients only execute it.

pub mod config;
pub mod health;
pub mod memory;
pub mod sparql;

pub use config::{MemoryStoreConfig, SparqlEndpointConfig, StoreConfig};
pub use health::{HealthCheckResult, HealthStatus};
pub use memory::{MemoryTripleStore, Quad};
pub use sparql::SparqlHttpClient;

use crate::error::{Result, TitleCacheError};
use crate::title::TitlePredicateList;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// An RDF term in object position
///
/// Serialized in the shape of a W3C SPARQL JSON results binding, so the same
/// type reads endpoint responses and quad dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RdfTerm {
    #[serde(rename = "uri")]
    Iri { value: String },

    #[serde(rename = "bnode")]
    BlankNode { value: String },

    #[serde(rename = "literal", alias = "typed-literal")]
    Literal {
        value: String,
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
}

impl RdfTerm {
    pub fn iri(value: impl Into<String>) -> Self {
        RdfTerm::Iri {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, RdfTerm::Literal { .. })
    }

    /// Lexical value of the term
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Iri { value } | RdfTerm::BlankNode { value } => value,
            RdfTerm::Literal { value, .. } => value,
        }
    }

    /// Language tag of a literal; empty tags count as absent
    pub fn language(&self) -> Option<&str> {
        match self {
            RdfTerm::Literal {
                lang: Some(lang), ..
            } if !lang.is_empty() => Some(lang),
            _ => None,
        }
    }

    /// Term rendered as a subject identifier
    pub fn to_subject_string(&self) -> String {
        match self {
            RdfTerm::BlankNode { value } => format!("_:{}", value),
            other => other.value().to_string(),
        }
    }
}

/// One result row of a title query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleRow {
    pub subject: String,
    pub predicate: String,
    pub object: RdfTerm,
}

/// Selects every title triple of one graph
#[derive(Debug, Clone)]
pub struct TitleQuery {
    pub graph: String,
    pub predicates: TitlePredicateList,
}

impl TitleQuery {
    pub fn new(graph: impl Into<String>, predicates: TitlePredicateList) -> Self {
        Self {
            graph: graph.into(),
            predicates,
        }
    }

    /// Reject the graph or any predicate that cannot be written as an IRIREF
    pub fn validate(&self) -> Result<()> {
        check_iri(&self.graph)?;
        self.predicates.iter().try_for_each(|p| check_iri(p))
    }

    /// SELECT over the graph, filtered to the title predicates
    pub fn to_sparql(&self) -> Result<String> {
        self.validate()?;

        let filter = self
            .predicates
            .iter()
            .map(|p| format!("?p = <{}>", p))
            .collect::<Vec<_>>()
            .join(" || ");

        Ok(format!(
            "SELECT ?s ?p ?o FROM <{}> WHERE {{ ?s ?p ?o . FILTER ( {} ) }}",
            self.graph, filter
        ))
    }

    /// Existence probe for the graph
    pub fn ask_graph_sparql(graph: &str) -> Result<String> {
        check_iri(graph)?;
        Ok(format!("ASK WHERE {{ GRAPH <{}> {{ ?s ?p ?o }} }}", graph))
    }
}

/// Fails unless `iri` can be placed between `<` and `>` in a query
///
/// IRIREF excludes whitespace, control characters and `<>"{}|^`\`.
pub fn check_iri(iri: &str) -> Result<()> {
    if iri.is_empty() {
        return Err(TitleCacheError::StoreError("empty IRI".to_string()));
    }

    match iri
        .chars()
        .find(|c| c.is_control() || c.is_whitespace() || "<>\"{}|^`\\".contains(*c))
    {
        Some(c) => Err(TitleCacheError::StoreError(format!(
            "invalid IRI \"{}\": character {:?} is not allowed",
            iri, c
        ))),
        None => Ok(()),
    }
}

/// Read access to an RDF triple store
#[async_trait]
pub trait TripleStoreClient: Send + Sync {
    /// Backend identifier recorded in graph statistics
    fn name(&self) -> &str;

    /// Whether `graph` holds at least one triple
    async fn ask(&self, graph: &str) -> Result<bool>;

    /// Rows matching `query`, in the order the store returns them
    async fn select_titles(&self, query: &TitleQuery) -> Result<Vec<TripleRow>>;

    /// Cheapest round trip the backend supports
    async fn ping(&self) -> Result<()>;

    /// Probe the store, never failing
    async fn health_check(&self, degraded_threshold_ms: u64) -> HealthCheckResult {
        let start = Instant::now();
        match self.ping().await {
            Ok(()) => HealthCheckResult::healthy(self.name(), start.elapsed(), degraded_threshold_ms),
            Err(e) => {
                warn!("Health check against {} failed: {}", self.name(), e);
                HealthCheckResult::unhealthy(self.name(), start.elapsed(), &e.to_string())
            }
        }
    }
}

/// Wraps a client so every call is bounded by the query timeout
pub struct TimedTripleStore {
    inner: Arc<dyn TripleStoreClient>,
    timeout: Duration,
}

impl TimedTripleStore {
    pub fn new(inner: Arc<dyn TripleStoreClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl TripleStoreClient for TimedTripleStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn ask(&self, graph: &str) -> Result<bool> {
        tokio::time::timeout(self.timeout, self.inner.ask(graph))
            .await
            .map_err(|_| TitleCacheError::store_timeout(self.timeout, &format!("ask <{}>", graph)))?
    }

    async fn select_titles(&self, query: &TitleQuery) -> Result<Vec<TripleRow>> {
        tokio::time::timeout(self.timeout, self.inner.select_titles(query))
            .await
            .map_err(|_| {
                TitleCacheError::store_timeout(self.timeout, &format!("select titles of <{}>", query.graph))
            })?
    }

    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.inner.ping())
            .await
            .map_err(|_| TitleCacheError::store_timeout(self.timeout, "ping"))?
    }
}

/// Connect to the backend named by `config.backend`
pub fn connect_store(config: &StoreConfig) -> Result<Arc<dyn TripleStoreClient>> {
    config.validate().map_err(TitleCacheError::ConfigError)?;

    let client: Arc<dyn TripleStoreClient> = match config.backend.as_str() {
        "virtuoso" => Arc::new(SparqlHttpClient::new("virtuoso", &config.virtuoso)?),
        "sparql" => Arc::new(SparqlHttpClient::new("sparql", &config.sparql)?),
        "memory" => match &config.memory.data {
            Some(path) => Arc::new(MemoryTripleStore::from_json_file(path)?),
            None => Arc::new(MemoryTripleStore::new()),
        },
        other => return Err(TitleCacheError::UnknownStoreBackend(other.to_string())),
    };

    info!("Connected to {} triple store", client.name());
    Ok(Arc::new(TimedTripleStore::new(client, config.query_timeout())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_query_sparql() {
        let predicates = TitlePredicateList::new(vec![
            "http://purl.org/dc/elements/1.1/title".to_string(),
            "http://www.w3.org/2000/01/rdf-schema#label".to_string(),
        ]);
        let query = TitleQuery::new("http://example.org/", predicates);

        assert_eq!(
            query.to_sparql().unwrap(),
            "SELECT ?s ?p ?o FROM <http://example.org/> WHERE { ?s ?p ?o . FILTER ( \
             ?p = <http://purl.org/dc/elements/1.1/title> || \
             ?p = <http://www.w3.org/2000/01/rdf-schema#label> ) }"
        );
        assert_eq!(
            TitleQuery::ask_graph_sparql("http://example.org/").unwrap(),
            "ASK WHERE { GRAPH <http://example.org/> { ?s ?p ?o } }"
        );
    }

    #[test]
    fn test_query_rejects_iri_breakout() {
        let err = TitleQuery::ask_graph_sparql("http://a/> {} } ; CLEAR GRAPH <http://victim/")
            .unwrap_err();
        assert!(matches!(err, TitleCacheError::StoreError(_)));

        let injected = TitleQuery::new(
            "http://a/> WHERE { } UNION { GRAPH <http://secret/",
            TitlePredicateList::default(),
        );
        assert!(injected.to_sparql().is_err());

        let bad_predicate = TitleQuery::new(
            "http://example.org/",
            TitlePredicateList::new(vec!["http://x/title> || true || <http://y".to_string()]),
        );
        assert!(bad_predicate.to_sparql().is_err());
    }

    #[test]
    fn test_check_iri() {
        assert!(check_iri("http://example.org/resource/Caf%C3%A9#x").is_ok());
        assert!(check_iri("urn:isbn:0451450523").is_ok());

        for bad in ["", "http://a b/", "http://a/\n", "http://a/\"", "http://a/{x}", "http://a/|", "http://a/^", "http://a/`", "http://a/\\"] {
            assert!(check_iri(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_term_from_sparql_json() {
        let term: RdfTerm =
            serde_json::from_str(r#"{"type":"literal","value":"Hallo","xml:lang":"de"}"#).unwrap();
        assert_eq!(term, RdfTerm::lang_literal("Hallo", "de"));
        assert_eq!(term.language(), Some("de"));

        let typed: RdfTerm = serde_json::from_str(
            r#"{"type":"typed-literal","value":"1","datatype":"http://www.w3.org/2001/XMLSchema#integer"}"#,
        )
        .unwrap();
        assert!(typed.is_literal());
        assert_eq!(typed.language(), None);

        let iri: RdfTerm = serde_json::from_str(r#"{"type":"uri","value":"http://x"}"#).unwrap();
        assert!(!iri.is_literal());

        let bnode: RdfTerm = serde_json::from_str(r#"{"type":"bnode","value":"b0"}"#).unwrap();
        assert_eq!(bnode.to_subject_string(), "_:b0");
    }

    #[test]
    fn test_empty_language_counts_as_absent() {
        let term = RdfTerm::lang_literal("Plain", "");
        assert_eq!(term.language(), None);
    }

    #[test]
    fn test_unknown_store_backend() {
        let config = StoreConfig {
            backend: "fuseki-embedded".to_string(),
            ..Default::default()
        };
        let err = connect_store(&config).err().unwrap();
        assert_eq!(
            err,
            TitleCacheError::UnknownStoreBackend("fuseki-embedded".to_string())
        );
    }

    #[tokio::test]
    async fn test_memory_backend_health() {
        let config = StoreConfig {
            backend: "memory".to_string(),
            ..Default::default()
        };
        let store = connect_store(&config).unwrap();
        assert_eq!(store.name(), "memory");

        let health = store.health_check(1_000).await;
        assert!(health.status.is_operational());
    }
}
