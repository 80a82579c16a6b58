// tests/agents_api_tests.rs
//
// Wire-shape tests for the /api/agents endpoints. The JSON field names
// asserted here are frozen for existing callers.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ledgerly_backend::config::Config;
use ledgerly_backend::routes::api_router;
use ledgerly_backend::services::pipeline::create_orchestrator;
use ledgerly_backend::state::AppState;

fn test_app(config: Config) -> Router {
    let orchestrator = create_orchestrator(&config).unwrap();
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        config: Arc::new(config),
    };
    api_router().with_state(state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri(uri)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn process_shorthand_invoice_approves() {
    let app = test_app(Config::default());
    let (status, body) = post_json(
        app,
        "/api/agents/process",
        json!({"invoiceNumber": "INV-1", "vendorName": "Acme", "amount": 499}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["document"]["invoiceNumber"], json!("INV-1"));
    assert_eq!(body["document"]["vendorName"], json!("Acme"));
    assert_eq!(body["document"]["amount"], json!(499.0));
    assert_eq!(body["pipeline"]["status"], json!("approved"));
    assert_eq!(body["pipeline"]["stagesCompleted"], json!(6));
    assert!(body["pipeline"]["traceId"].is_string());
    assert!(body["pipeline"]["durationMs"].is_number());

    let decisions = body["decisions"].as_array().unwrap();
    assert_eq!(decisions.len(), 6);
    for decision in decisions {
        assert!(decision["agent"].is_string());
        assert!(decision["action"].is_string());
        assert!(decision["outcome"].is_string());
        assert!(decision["confidence"].is_number());
        assert!(decision["reasoning"].is_string());
        assert!(decision["timestamp"].is_string());
    }

    // errors is omitted entirely when empty.
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn process_rejects_unusable_body() {
    let app = test_app(Config::default());
    let (status, _body) = post_json(app, "/api/agents/process", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn process_block_is_a_200_not_an_error() {
    let config = Config {
        require_vendor_tax_id: true,
        ..Config::default()
    };
    let app = test_app(config);
    let (status, body) = post_json(
        app,
        "/api/agents/process",
        json!({"invoiceNumber": "INV-2", "vendorName": "Acme", "amount": 499}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pipeline"]["status"], json!("flagged_for_review"));
    assert_eq!(body["pipeline"]["stagesCompleted"], json!(3));
    // A block is a decision, not an error.
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn process_accepts_full_document_body() {
    let app = test_app(Config::default());
    let (status, body) = post_json(
        app,
        "/api/agents/process",
        json!({
            "document": {
                "metadata": {
                    "invoiceNumber": "INV-3",
                    "vendorName": "Globex",
                    "amount": "1200"
                }
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pipeline"]["status"], json!("approved"));
    assert_eq!(body["document"]["invoiceNumber"], json!("INV-3"));
}

#[tokio::test]
async fn run_pipeline_returns_raw_result() {
    let app = test_app(Config::default());
    let (status, body) = post_json(
        app,
        "/api/agents",
        json!({
            "document": {
                "metadata": {
                    "invoiceNumber": "INV-4",
                    "vendorName": "Acme",
                    "amount": "250"
                }
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let result = &body["result"];
    assert!(result["documentId"].is_string());
    assert!(result["traceId"].is_string());
    assert_eq!(result["status"], json!("approved"));
    assert_eq!(
        result["decisionsCount"].as_u64().unwrap() as usize,
        result["decisions"].as_array().unwrap().len()
    );
    assert!(result["durationMs"].is_number());
    assert_eq!(result["errors"], json!([]));
}

#[tokio::test]
async fn list_agents_reports_registry_health() {
    let app = test_app(Config::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/agents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], json!("ok"));
    assert!(body["timestamp"].is_string());
    assert_eq!(body["health"]["totalAgents"], json!(6));
    assert_eq!(body["health"]["idle"], json!(6));
    assert_eq!(body["health"]["processing"], json!(0));
    assert_eq!(body["health"]["error"], json!(0));

    let agents = body["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 6);
    for agent in agents {
        assert!(agent["id"].is_string());
        assert!(agent["name"].is_string());
        assert!(agent["capabilities"].is_array());
        assert_eq!(agent["status"], json!("idle"));
        assert_eq!(agent["processedCount"], json!(0));
        assert_eq!(agent["averageLatencyMs"], json!(0.0));
        assert!(agent["lastProcessedAt"].is_null());
    }
}

#[tokio::test]
async fn stats_accumulate_across_requests() {
    let app = test_app(Config::default());

    let (status, _) = post_json(
        app.clone(),
        "/api/agents/process",
        json!({"invoiceNumber": "INV-5", "vendorName": "Acme", "amount": 42}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/agents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    for agent in body["agents"].as_array().unwrap() {
        assert_eq!(agent["processedCount"], json!(1));
        assert!(agent["lastProcessedAt"].is_string());
    }
}
