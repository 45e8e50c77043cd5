// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /versions  (empty store, populated store, wire field names)
// - POST /refresh  (synchronous cycle + persistence)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use version_watch::adapter::{ExtractionResult, VersionAdapter};
use version_watch::api::{create_router, AppState};
use version_watch::registry::AdapterRegistry;
use version_watch::source::SourceId;
use version_watch::store::VersionStore;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct FixedAdapter {
    name: String,
    version: String,
}

#[async_trait::async_trait]
impl VersionAdapter for FixedAdapter {
    async fn extract(&self) -> ExtractionResult {
        ExtractionResult::Version(self.version.clone())
    }
    fn name(&self) -> &str {
        &self.name
    }
}

fn fixed(name: &str, version: &str) -> Arc<dyn VersionAdapter> {
    Arc::new(FixedAdapter {
        name: name.into(),
        version: version.into(),
    })
}

/// Build the same Router the binary uses, backed by a temp state file.
fn test_router(dir: &tempfile::TempDir, registry: AdapterRegistry) -> (Router, Arc<VersionStore>) {
    let store = Arc::new(VersionStore::open(dir.path().join("state.json")).expect("open store"));
    let state = AppState {
        store: store.clone(),
        registry: Arc::new(registry),
        adapter_timeout: Duration::from_secs(5),
    };
    (create_router(state, dir.path().join("public")), store)
}

async fn body_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_router(&dir, AdapterRegistry::default());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8_lossy(&bytes).trim(), "OK");
}

#[tokio::test]
async fn versions_is_empty_object_before_any_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_router(&dir, AdapterRegistry::default());

    let req = Request::builder()
        .method("GET")
        .uri("/versions")
        .body(Body::empty())
        .expect("build GET /versions");

    let resp = app.oneshot(req).await.expect("oneshot /versions");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v, serde_json::json!({}));
}

#[tokio::test]
async fn versions_exposes_current_and_prev_fields() {
    let dir = tempfile::tempdir().unwrap();
    let (app, store) = test_router(&dir, AdapterRegistry::default());

    let id = SourceId::from("https://tomcat.apache.org/");
    store.apply(&id, &ExtractionResult::Version("10.1.12".into()));
    store.apply(&id, &ExtractionResult::Version("10.1.13".into()));

    let req = Request::builder()
        .method("GET")
        .uri("/versions")
        .body(Body::empty())
        .expect("build GET /versions");

    let resp = app.oneshot(req).await.expect("oneshot /versions");
    let v = body_json(resp).await;

    // Dashboard contract: keys are canonical URLs, fields are current/prev.
    let record = v
        .get("https://tomcat.apache.org/")
        .expect("record for source id");
    assert_eq!(record.get("current").unwrap(), "10.1.13");
    assert_eq!(record.get("prev").unwrap(), "10.1.12");
}

#[tokio::test]
async fn refresh_runs_a_cycle_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let registry = AdapterRegistry::from_adapters([
        (SourceId::from("https://a.example.org/"), fixed("a", "1.0.0")),
        (SourceId::from("https://b.example.org/"), fixed("b", "2.0.0")),
    ]);
    let (app, store) = test_router(&dir, registry);

    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .expect("build POST /refresh");

    let resp = app.clone().oneshot(req).await.expect("oneshot /refresh");
    assert_eq!(resp.status(), StatusCode::OK);
    let report = body_json(resp).await;
    assert_eq!(report.get("successes").unwrap(), 2);
    assert_eq!(report.get("failures").unwrap().as_array().unwrap().len(), 0);
    assert_eq!(report.get("changed").unwrap(), 2);

    // the call completes only after results are persisted
    assert!(dir.path().join("state.json").exists());
    assert_eq!(store.len(), 2);

    // and the query path reflects the cycle
    let req = Request::builder()
        .method("GET")
        .uri("/versions")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.expect("oneshot /versions");
    let v = body_json(resp).await;
    assert_eq!(
        v.get("https://a.example.org/")
            .unwrap()
            .get("current")
            .unwrap(),
        "1.0.0"
    );
}

#[tokio::test]
async fn refresh_reports_failures_without_failing_the_request() {
    struct Failing;
    #[async_trait::async_trait]
    impl VersionAdapter for Failing {
        async fn extract(&self) -> ExtractionResult {
            ExtractionResult::failed("selector 'h1' matched nothing")
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let registry = AdapterRegistry::from_adapters([
        (SourceId::from("https://a.example.org/"), fixed("a", "1.0.0")),
        (
            SourceId::from("https://down.example.org/"),
            Arc::new(Failing) as Arc<dyn VersionAdapter>,
        ),
    ]);
    let (app, _store) = test_router(&dir, registry);

    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.expect("oneshot /refresh");
    assert_eq!(
        resp.status(),
        StatusCode::OK,
        "adapter failures are data, not 5xx"
    );

    let report = body_json(resp).await;
    assert_eq!(report.get("successes").unwrap(), 1);
    let failures = report.get("failures").unwrap().as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].get("source").unwrap(),
        "https://down.example.org/"
    );
    assert!(failures[0]
        .get("reason")
        .unwrap()
        .as_str()
        .unwrap()
        .contains("matched nothing"));
}
