//! Routing integration tests
//!
//! - GET / and GET /api/hello greetings
//! - 404 body for unknown routes
//! - Debug routes gated by DEBUG_ROUTES
//! - Prometheus metrics endpoint

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn test_root_greeting() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"message": "Hello API"}));
}

#[tokio::test]
async fn test_hello_world() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/api/hello").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["message"], "Hello, World!");
    assert!(json["timestamp"].is_i64());
}

#[tokio::test]
async fn test_unknown_route_returns_not_found_body() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/api/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let json: Value = response.json();
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_debug_routes_enabled() {
    let app = TestApp::spawn_with(&[("DEBUG_ROUTES", "true")]).await;

    let response = app.server.get("/api/debug/ping").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["message"], "Debug router is working");
    assert_eq!(json["environment"], "test");

    let response = app.server.get("/api/debug/config").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["provider_configured"], true);
    assert_eq!(json["provider_initialized"], false);
    assert_eq!(json["rate_limit_tiers"].as_array().unwrap().len(), 3);
    assert_eq!(json["rate_limit_tiers"][2]["name"], "sensitive");
    assert_eq!(json["rate_limit_tiers"][2]["window_seconds"], 3600);
}

#[tokio::test]
async fn test_debug_routes_hidden_when_disabled() {
    let app = TestApp::spawn_with(&[("DEBUG_ROUTES", "false")]).await;

    let response = app.server.get("/api/debug/ping").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    gatehouse::routes::metrics::init_metrics();
    let app = TestApp::spawn().await;

    app.server.get("/api/me").await;

    let response = app.server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("gatehouse_auth_attempts_total"));
}
