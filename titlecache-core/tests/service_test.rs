//! Action envelopes end to end through `TitleCache`

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use titlecache_core::store::{MemoryTripleStore, Quad};
use titlecache_core::{ActionRequest, HealthStatus, RdfTerm, Status, TitleCache, TitleCacheConfig};

const GRAPH: &str = "http://example.org/";
const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";
const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";

fn store() -> Arc<MemoryTripleStore> {
    Arc::new(MemoryTripleStore::with_quads(vec![
        Quad::new(GRAPH, "http://example.org/1", SKOS_PREF_LABEL, RdfTerm::lang_literal("Erster", "de")),
        Quad::new(GRAPH, "http://example.org/1", DC_TITLE, RdfTerm::lang_literal("First", "en")),
        Quad::new(GRAPH, "http://example.org/2", DC_TITLE, RdfTerm::literal("Second")),
        Quad::new("http://books.org/", "http://books.org/b", DC_TITLE, RdfTerm::lang_literal("Buch", "de")),
    ]))
}

fn service() -> TitleCache {
    TitleCache::new(TitleCacheConfig::default()).with_store(store())
}

#[tokio::test]
async fn test_create_then_get() {
    let service = service();

    let created = service.run(ActionRequest::new("create")).await;
    assert_eq!(created.status, Status::Success);
    assert_eq!(created.data["counts"], 2);
    assert_eq!(created.data["graph"], GRAPH);
    assert_eq!(created.data["backend"], "memory");
    assert_eq!(created.data["default_lang"], "en");
    assert_eq!(created.data["default_title_uri"], DC_TITLE);
    assert!(created
        .message
        .as_deref()
        .unwrap()
        .starts_with("Successfully created the cache."));

    let got = service
        .run(
            ActionRequest::new("get")
                .with_uris(["http://example.org/1", "http://example.org/2", "http://example.org/9"])
                .with_lang("de"),
        )
        .await;
    assert_eq!(got.status, Status::Success);
    assert_eq!(
        got.data,
        json!({
            "http://example.org/1": "Erster",
            "http://example.org/2": "Second",
            "http://example.org/9": null
        })
    );
    assert_eq!(got.message, None);
}

#[tokio::test]
async fn test_second_create_reports_update() {
    let service = service();
    service.run(ActionRequest::new("create")).await;

    let again = service.run(ActionRequest::new("create")).await;
    assert!(again
        .message
        .as_deref()
        .unwrap()
        .starts_with("Successfully updated the cache."));
}

#[tokio::test]
async fn test_get_defaults_to_default_lang() {
    let service = service();
    service.run(ActionRequest::new("create")).await;

    let got = service
        .run(ActionRequest::new("get").with_uris(["http://example.org/1"]))
        .await;
    assert_eq!(got.data["http://example.org/1"], "First");
}

#[tokio::test]
async fn test_graph_override() {
    let service = service();
    service
        .run(ActionRequest::new("create").with_graph("http://books.org/"))
        .await;

    let got = service
        .run(
            ActionRequest::new("get")
                .with_graph("http://books.org/")
                .with_uris(["http://books.org/b"]),
        )
        .await;
    assert_eq!(got.data["http://books.org/b"], "Buch");

    // the default graph was never populated
    let missing = service
        .run(ActionRequest::new("get").with_uris(["http://example.org/1"]))
        .await;
    assert_eq!(missing.status, Status::Error);
    assert_eq!(
        missing.message.as_deref(),
        Some("Cannot get the cache for graph \"http://example.org/\". It does not exists. Choose another graph or create the cache first by calling: action=create&graph=http://example.org/")
    );
}

#[tokio::test]
async fn test_get_without_uris() {
    let service = service();
    service.run(ActionRequest::new("create")).await;

    let envelope = service.run(ActionRequest::new("get")).await;
    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.data, serde_json::Value::Null);
    assert!(envelope.message.unwrap().starts_with("No uris given."));
}

#[tokio::test]
async fn test_create_unknown_graph() {
    let envelope = service()
        .run(ActionRequest::new("create").with_graph("http://nowhere.org/"))
        .await;
    assert_eq!(
        envelope.message.as_deref(),
        Some("Cannot create the cache: graph \"http://nowhere.org/\" does not exists in your store. Choose another graph or create it in your store.")
    );
}

#[tokio::test]
async fn test_create_rejects_malformed_graph() {
    let envelope = service()
        .run(ActionRequest::new("create").with_graph("http://a/> {} } ; CLEAR GRAPH <http://victim/"))
        .await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope
        .message
        .as_deref()
        .unwrap()
        .starts_with("Store error: invalid IRI"));
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = TempDir::new().unwrap();
    let overrides = json!({"cache": {"backend": "file", "file": {"path": dir.path()}}});

    let first = service();
    let created = first
        .run(ActionRequest::new("create").with_config(overrides.clone()))
        .await;
    assert_eq!(created.data["cache"], "file");

    let second = TitleCache::new(TitleCacheConfig::default());
    let got = second
        .run(
            ActionRequest::new("get")
                .with_uris(["http://example.org/1"])
                .with_lang("en")
                .with_config(overrides),
        )
        .await;
    assert_eq!(got.status, Status::Success);
    assert_eq!(got.data["http://example.org/1"], "First");
}

#[tokio::test]
async fn test_predicate_override() {
    let service = service();
    let created = service
        .run(ActionRequest::new("create").with_config(json!({"predicates": [SKOS_PREF_LABEL]})))
        .await;
    assert_eq!(created.data["counts"], 1);
    assert_eq!(created.data["default_title_uri"], SKOS_PREF_LABEL);
}

#[tokio::test]
async fn test_invalid_override_is_error_envelope() {
    let envelope = service()
        .run(ActionRequest::new("get").with_config(json!({"default_lang": ""})))
        .await;
    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().starts_with("Configuration error"));
}

#[tokio::test]
async fn test_store_health() {
    let health = service().store_health().await;
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.backend, "memory");
}
