//! SPARQL protocol client against a local fake endpoint

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use titlecache_core::cache::{MemoryCacheConfig, MemoryStore};
use titlecache_core::store::{
    connect_store, SparqlEndpointConfig, SparqlHttpClient, StoreConfig, TitleQuery,
    TripleStoreClient,
};
use titlecache_core::{HealthStatus, Populator, RdfTerm, Resolver, TitleCacheError, TitlePredicateList};

const GRAPH: &str = "http://example.org/";

/// Queries seen by the fake endpoint with their Authorization header
type QueryLog = Arc<Mutex<Vec<(String, Option<String>)>>>;

async fn sparql(
    State(log): State<QueryLog>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let query = form.get("query").cloned().unwrap_or_default();
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    log.lock().unwrap().push((query.clone(), auth));

    if query.starts_with("ASK") {
        let known = query == "ASK { }" || query.contains(&format!("<{}>", GRAPH));
        return Json(json!({"head": {}, "boolean": known}));
    }

    Json(json!({
        "head": {"vars": ["s", "p", "o"]},
        "results": {"bindings": [
            {"s": {"type": "uri", "value": "http://example.org/1"},
             "p": {"type": "uri", "value": "http://www.w3.org/2000/01/rdf-schema#label"},
             "o": {"type": "literal", "value": "Eins", "xml:lang": "de"}},
            {"s": {"type": "uri", "value": "http://example.org/1"},
             "p": {"type": "uri", "value": "http://purl.org/dc/elements/1.1/title"},
             "o": {"type": "literal", "value": "One", "xml:lang": "en"}},
            {"s": {"type": "uri", "value": "http://example.org/2"},
             "p": {"type": "uri", "value": "http://purl.org/dc/elements/1.1/title"},
             "o": {"type": "typed-literal", "value": "2",
                   "datatype": "http://www.w3.org/2001/XMLSchema#integer"}},
            {"s": {"type": "uri", "value": "http://example.org/3"},
             "p": {"type": "uri", "value": "http://purl.org/dc/elements/1.1/title"},
             "o": {"type": "uri", "value": "http://example.org/1"}}
        ]}
    }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Virtuoso 42000 Error SQ200")
}

/// Start the fake endpoint on an ephemeral port
async fn start_endpoint() -> (SocketAddr, QueryLog) {
    let log: QueryLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/sparql", post(sparql))
        .route("/broken", post(broken))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, log)
}

fn endpoint_config(addr: SocketAddr, path: &str) -> SparqlEndpointConfig {
    SparqlEndpointConfig {
        endpoint: format!("http://{}{}", addr, path),
        username: Some("dba".to_string()),
        password: Some("dba".to_string()),
    }
}

#[tokio::test]
async fn test_ask_and_select() {
    let (addr, log) = start_endpoint().await;
    let client = SparqlHttpClient::new("virtuoso", &endpoint_config(addr, "/sparql")).unwrap();

    assert!(client.ask(GRAPH).await.unwrap());
    assert!(!client.ask("http://missing.org/").await.unwrap());

    let query = TitleQuery::new(GRAPH, TitlePredicateList::default());
    let rows = client.select_titles(&query).await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].object, RdfTerm::lang_literal("Eins", "de"));
    assert!(rows[2].object.is_literal());
    assert!(!rows[3].object.is_literal());

    let log = log.lock().unwrap();
    assert_eq!(log[0].0, TitleQuery::ask_graph_sparql(GRAPH).unwrap());
    assert_eq!(log[2].0, query.to_sparql().unwrap());
    assert_eq!(log[0].1.as_deref(), Some("Basic ZGJhOmRiYQ=="));
}

#[tokio::test]
async fn test_populate_through_endpoint() {
    let (addr, _log) = start_endpoint().await;
    let config = StoreConfig {
        backend: "virtuoso".to_string(),
        virtuoso: endpoint_config(addr, "/sparql"),
        ..Default::default()
    };
    let store = connect_store(&config).unwrap();
    let cache = Arc::new(MemoryStore::new(MemoryCacheConfig::default()));

    let summary = Populator::new(store, cache.clone())
        .populate(GRAPH, &TitlePredicateList::default(), "en")
        .await
        .unwrap();
    assert_eq!(summary.backend, "virtuoso");
    assert_eq!(summary.counts, 2);

    let subjects = vec![
        "http://example.org/1".to_string(),
        "http://example.org/2".to_string(),
        "http://example.org/3".to_string(),
    ];
    let titles = Resolver::new(cache)
        .resolve(GRAPH, &subjects, "de", "en")
        .await
        .unwrap();
    assert_eq!(titles["http://example.org/1"].as_deref(), Some("Eins"));
    assert_eq!(titles["http://example.org/2"].as_deref(), Some("2"));
    assert_eq!(titles["http://example.org/3"], None);
}

#[tokio::test]
async fn test_missing_graph_through_endpoint() {
    let (addr, _log) = start_endpoint().await;
    let store = Arc::new(SparqlHttpClient::new("sparql", &endpoint_config(addr, "/sparql")).unwrap());
    let cache = Arc::new(MemoryStore::new(MemoryCacheConfig::default()));

    let err = Populator::new(store, cache)
        .populate("http://missing.org/", &TitlePredicateList::default(), "en")
        .await
        .unwrap_err();
    assert_eq!(err, TitleCacheError::GraphNotFound("http://missing.org/".to_string()));
}

#[tokio::test]
async fn test_malformed_graph_never_reaches_endpoint() {
    let (addr, log) = start_endpoint().await;
    let store = Arc::new(SparqlHttpClient::new("virtuoso", &endpoint_config(addr, "/sparql")).unwrap());
    let cache = Arc::new(MemoryStore::new(MemoryCacheConfig::default()));

    let graph = "http://a/> {} } ; CLEAR GRAPH <http://victim/";
    let err = Populator::new(store.clone(), cache)
        .populate(graph, &TitlePredicateList::default(), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, TitleCacheError::StoreError(_)));

    assert!(store.ask(graph).await.is_err());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_is_store_error() {
    let (addr, _log) = start_endpoint().await;
    let client = SparqlHttpClient::new("virtuoso", &endpoint_config(addr, "/broken")).unwrap();

    match client.ask(GRAPH).await {
        Err(TitleCacheError::StoreError(message)) => assert!(message.contains("500")),
        other => panic!("expected StoreError, got {:?}", other),
    }

    let health = client.health_check(1000).await;
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(health.error.is_some());
}

#[tokio::test]
async fn test_health_check_against_endpoint() {
    let (addr, _log) = start_endpoint().await;
    let client = SparqlHttpClient::new("virtuoso", &endpoint_config(addr, "/sparql")).unwrap();

    let health = client.health_check(60_000).await;
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.backend, "virtuoso");
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SparqlHttpClient::new("virtuoso", &endpoint_config(addr, "/sparql")).unwrap();
    assert!(matches!(
        client.ask(GRAPH).await,
        Err(TitleCacheError::StoreError(_))
    ));
}
