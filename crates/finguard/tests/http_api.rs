//! HTTP surface tests: routes driven with `oneshot` against scripted agents.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use finguard::agents::test_support::{sample_fraud_report, CountingBrokerSource, StubBackend};
use finguard::agents::{
    profile_table, AgentBackend, AgentError, AgentFactory, ConversationAgent, QueryOrchestrator,
};
use finguard::models::{AgentProfile, AgentsConfig, CredentialSet};
use finguard::{router, AppState};
use tower::ServiceExt;

fn app_with(
    source: &Arc<CountingBrokerSource>,
    backend: Arc<dyn AgentBackend>,
    static_dir: &Path,
) -> Router {
    let orchestrator = QueryOrchestrator::new(AgentFactory::new(
        Arc::new(profile_table(&AgentsConfig::default())),
        source.clone(),
        backend,
    ));
    router(AppState::new(orchestrator), static_dir)
}

fn app(source: &Arc<CountingBrokerSource>, backend: StubBackend) -> Router {
    app_with(source, Arc::new(backend), Path::new("static"))
}

fn analyze(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn analyze_returns_query_result() {
    let source = Arc::new(CountingBrokerSource::new());
    let backend =
        StubBackend::answering(&["Analysis ", "complete"]).with_report(sample_fraud_report());
    let app = app(&source, backend);

    let response = app
        .oneshot(analyze(
            r#"{"agent_type": "fraud_detection", "query": "Check TXN-1042"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["response"], "Analysis complete");
    assert_eq!(json["agent_type"], "fraud_detection");
    assert_eq!(json["structured_data"]["risk_level"], "HIGH");
    assert_eq!(
        json["structured_data"]["high_risk_transactions"][0]["transaction_id"],
        "TXN-1042"
    );
    assert!(json["structured_data"]["fraud_probability"].is_number());
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
    assert_eq!(source.stats().checkins(), 1);
}

#[tokio::test]
async fn agent_type_defaults_to_fraud_detection() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app(&source, StubBackend::answering(&["ok"]));

    let response = app
        .oneshot(analyze(r#"{"query": "Any suspicious wires today?"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["agent_type"], "fraud_detection");
    assert!(json["structured_data"].is_null());
}

#[tokio::test]
async fn empty_query_is_400() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app(&source, StubBackend::answering(&["unused"]));

    let response = app
        .oneshot(analyze(r#"{"agent_type": "compliance", "query": "   "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Query cannot be empty");
    assert_eq!(source.stats().checkouts(), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app(&source, StubBackend::answering(&["unused"]));

    let response = app.oneshot(analyze("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn provisioning_failure_is_500_with_message() {
    let source = Arc::new(CountingBrokerSource::failing());
    let app = app(&source, StubBackend::answering(&["unused"]));

    let response = app
        .oneshot(analyze(r#"{"agent_type": "compliance", "query": "SOX status"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("profile not permitted"));
}

#[tokio::test]
async fn stream_failure_is_generic_500() {
    let source = Arc::new(CountingBrokerSource::new());
    let backend = StubBackend::answering(&["partial"]).with_stream_error("socket closed");
    let app = app(&source, backend);

    let response = app
        .oneshot(analyze(r#"{"agent_type": "risk_analysis", "query": "VaR please"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(!json["error"].as_str().unwrap().contains("socket closed"));
    assert_eq!(source.stats().checkins(), 1);
}

struct PanickingBackend;

impl AgentBackend for PanickingBackend {
    fn build(
        &self,
        _profile: &AgentProfile,
        _credentials: &CredentialSet,
    ) -> Result<Box<dyn ConversationAgent>, AgentError> {
        panic!("backend exploded");
    }
}

#[tokio::test]
async fn panicking_agent_is_500_and_checks_in() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app_with(&source, Arc::new(PanickingBackend), Path::new("static"));

    let response = app
        .oneshot(analyze(r#"{"agent_type": "compliance", "query": "SOX status"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(source.stats().checkouts(), 1);
    assert_eq!(source.stats().checkins(), 1);
}

#[tokio::test]
async fn index_serves_html() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app(&source, StubBackend::answering(&[]));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/api/analyze"));
    assert!(html.contains("risk_analysis"));
}

#[tokio::test]
async fn static_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.css"), "body { color: red; }").unwrap();
    let source = Arc::new(CountingBrokerSource::new());
    let app = app_with(&source, Arc::new(StubBackend::answering(&[])), dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/static/app.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/static/missing.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let source = Arc::new(CountingBrokerSource::new());
    let app = app(&source, StubBackend::answering(&[]));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/analyze")
                .header("origin", "http://localhost:3000")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
