//! Integration tests for the liveness and readiness probes.

mod common;

use axum::http::StatusCode;
use file_portal::state::AppState;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn healthz_is_always_ok() {
    let state = common::test_state("http://127.0.0.1:4000");
    let (status, _, body) = common::send(common::app(state), common::get("/healthz", None)).await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
}

#[tokio::test]
async fn readyz_reports_ready_when_backend_answers() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let state = common::test_state(&server.uri());
    let (status, _, body) = common::send(common::app(state), common::get("/readyz", None)).await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["checks"]["backend"]["ok"], true);
    assert_eq!(parsed["checks"]["oauth"]["ok"], true);
}

#[tokio::test]
async fn readyz_is_unavailable_when_backend_is_down() {
    // Nothing listens on port 1; the probe fails fast.
    let state = common::test_state("http://127.0.0.1:1");
    let (status, _, body) = common::send(common::app(state), common::get("/readyz", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "error");
    assert_eq!(parsed["checks"]["backend"]["ok"], false);
}

#[tokio::test]
async fn missing_oauth_config_is_reported_but_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut cfg = common::test_config(&server.uri());
    cfg.google_client_id = String::new();
    let state = AppState::new(cfg).unwrap();

    let (status, _, body) = common::send(common::app(state), common::get("/readyz", None)).await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["checks"]["oauth"]["ok"], false);
    assert_eq!(parsed["checks"]["backend"]["ok"], true);
}
