//! SPARQL 1.1 protocol client
//!
//! Queries are POSTed form-encoded and answered in the W3C SPARQL JSON
//! results format. Works against Virtuoso's `/sparql` endpoint as well as
//! any other conforming server.

use crate::error::{Result, TitleCacheError};
use crate::store::{RdfTerm, SparqlEndpointConfig, TitleQuery, TripleRow, TripleStoreClient};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// SPARQL JSON results document (SELECT or ASK)
#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub boolean: Option<bool>,
    #[serde(default)]
    pub results: Option<SparqlBindings>,
}

#[derive(Debug, Deserialize)]
pub struct SparqlBindings {
    pub bindings: Vec<HashMap<String, RdfTerm>>,
}

impl SparqlResults {
    /// Answer of an ASK query
    pub fn ask_answer(&self) -> Result<bool> {
        self.boolean.ok_or_else(|| {
            TitleCacheError::StoreError("ASK response carried no boolean".to_string())
        })
    }

    /// Rows of a `?s ?p ?o` SELECT; rows missing a variable are skipped
    pub fn into_rows(self) -> Vec<TripleRow> {
        self.results
            .map(|r| r.bindings)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|mut binding| {
                let subject = binding.remove("s")?;
                let predicate = binding.remove("p")?;
                let object = binding.remove("o")?;
                Some(TripleRow {
                    subject: subject.to_subject_string(),
                    predicate: predicate.value().to_string(),
                    object,
                })
            })
            .collect()
    }
}

/// HTTP client for one SPARQL endpoint
pub struct SparqlHttpClient {
    backend: String,
    http: reqwest::Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

impl SparqlHttpClient {
    /// Create a client for `config.endpoint`
    ///
    /// Nothing is sent until the first query; an unusable endpoint shows up
    /// as a `StoreError` then.
    pub fn new(backend: &str, config: &SparqlEndpointConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(TitleCacheError::StoreInitError(backend.to_string()));
        }

        let http = reqwest::Client::builder().build().map_err(|e| {
            error!("Failed to build HTTP client for {}: {}", backend, e);
            TitleCacheError::StoreInitError(backend.to_string())
        })?;

        info!("Using SPARQL endpoint {} ({})", config.endpoint, backend);

        Ok(Self {
            backend: backend.to_string(),
            http,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one query and decode the JSON results
    pub async fn execute(&self, sparql: &str) -> Result<SparqlResults> {
        debug!("SPARQL query: {}", sparql);

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", sparql)]);

        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            error!("SPARQL request to {} failed: {}", self.endpoint, e);
            TitleCacheError::StoreError(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("SPARQL endpoint returned {}: {}", status, body);
            return Err(TitleCacheError::StoreError(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json::<SparqlResults>()
            .await
            .map_err(|e| TitleCacheError::StoreError(format!("invalid SPARQL results: {}", e)))
    }
}

#[async_trait]
impl TripleStoreClient for SparqlHttpClient {
    fn name(&self) -> &str {
        &self.backend
    }

    async fn ask(&self, graph: &str) -> Result<bool> {
        self.execute(&TitleQuery::ask_graph_sparql(graph)?)
            .await?
            .ask_answer()
    }

    async fn select_titles(&self, query: &TitleQuery) -> Result<Vec<TripleRow>> {
        let rows = self.execute(&query.to_sparql()?).await?.into_rows();
        debug!("Title query on <{}> returned {} rows", query.graph, rows.len());
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        self.execute("ASK { }").await?.ask_answer().map(|_| ())
    }
}
