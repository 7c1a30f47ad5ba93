//! Rate limiting integration tests
//!
//! Tests for the rate limiting middleware:
//! - Tier ceilings (general 100, auth 10, sensitive 5)
//! - Standard RateLimit-* headers, Retry-After on 429, no X-RateLimit-*
//! - Per-tier counter isolation
//! - Client keys from X-Forwarded-For when the proxy is trusted
//! - Shared counters in Redis (skipped when Redis is unavailable)

use axum::http::StatusCode;
use axum_test::TestResponse;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{forwarded_for, with_bearer, TestApp};
use crate::mocks::SupabaseTestData;

/// Test helper to check Redis availability (skips test if unavailable)
async fn redis_available() -> bool {
    let Ok(client) = redis::Client::open("redis://127.0.0.1:6379") else {
        return false;
    };
    client.get_connection_manager().await.is_ok()
}

/// Unique client key so Redis-backed runs do not collide
fn unique_client(test_name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", test_name, nanos)
}

fn header_u64(response: &TestResponse, name: &str) -> u64 {
    response.headers()[name].to_str().unwrap().parse().unwrap()
}

fn assert_no_legacy_headers(response: &TestResponse) {
    assert!(
        response
            .headers()
            .keys()
            .all(|name| !name.as_str().starts_with("x-ratelimit")),
        "legacy X-RateLimit-* headers must not be sent"
    );
}

#[tokio::test]
async fn test_general_tier_admits_exactly_100() {
    let app = TestApp::spawn().await;

    for i in 0..100u64 {
        let response = app.server.get("/api/hello").await;
        response.assert_status_ok();
        assert_eq!(header_u64(&response, "ratelimit-limit"), 100);
        assert_eq!(header_u64(&response, "ratelimit-remaining"), 99 - i);
        assert_no_legacy_headers(&response);
    }

    let response = app.server.get("/api/hello").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_no_legacy_headers(&response);
    assert_eq!(header_u64(&response, "ratelimit-remaining"), 0);

    let reset = header_u64(&response, "ratelimit-reset");
    assert!(reset > 0 && reset <= 15 * 60);
    assert_eq!(header_u64(&response, "retry-after"), reset);

    let json: Value = response.json();
    assert_eq!(
        json,
        json!({
            "error": "Too Many Requests",
            "code": "RATE_LIMIT_EXCEEDED",
            "details": "Too many requests from this IP, please try again later"
        })
    );
}

#[tokio::test]
async fn test_auth_tier_stops_repeated_failed_attempts() {
    let app = TestApp::spawn().await;

    for _ in 0..10 {
        let response = with_bearer(
            app.server.post("/api/auth/session"),
            SupabaseTestData::UNKNOWN_TOKEN,
        )
        .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["code"], "INVALID_TOKEN");
    }

    let response = with_bearer(
        app.server.post("/api/auth/session"),
        SupabaseTestData::VALID_TOKEN,
    )
    .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    let json: Value = response.json();
    assert_eq!(json["code"], "AUTH_RATE_LIMIT_EXCEEDED");
    assert_eq!(
        json["details"],
        "Too many authentication attempts, please try again later"
    );

    // The limiter runs first, so the rejected attempt never reached the provider
    assert_eq!(app.supabase.verification_count().await, 10);
}

#[tokio::test]
async fn test_sensitive_tier_admits_five() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        let response = with_bearer(
            app.server.delete("/api/auth/session"),
            SupabaseTestData::VALID_TOKEN,
        )
        .await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(header_u64(&response, "ratelimit-limit"), 5);
    }

    let response = with_bearer(
        app.server.delete("/api/auth/session"),
        SupabaseTestData::VALID_TOKEN,
    )
    .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(header_u64(&response, "retry-after") <= 60 * 60);

    let json: Value = response.json();
    assert_eq!(json["code"], "SENSITIVE_RATE_LIMIT_EXCEEDED");
    assert_eq!(
        json["details"],
        "Too many sensitive operation attempts, please try again later"
    );
}

#[tokio::test]
async fn test_tiers_keep_separate_counters() {
    let app = TestApp::spawn().await;

    for _ in 0..11 {
        with_bearer(
            app.server.post("/api/auth/session"),
            SupabaseTestData::VALID_TOKEN,
        )
        .await;
    }

    let response = app.server.get("/api/hello").await;
    response.assert_status_ok();
    assert_eq!(header_u64(&response, "ratelimit-remaining"), 99);
}

#[tokio::test]
async fn test_trusted_proxy_keys_by_forwarded_for() {
    let app = TestApp::spawn_with(&[("TRUST_PROXY", "true")]).await;

    for _ in 0..5 {
        forwarded_for(
            with_bearer(
                app.server.delete("/api/auth/session"),
                SupabaseTestData::VALID_TOKEN,
            ),
            "203.0.113.10",
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
    }

    forwarded_for(
        with_bearer(
            app.server.delete("/api/auth/session"),
            SupabaseTestData::VALID_TOKEN,
        ),
        "203.0.113.10, 10.0.0.1",
    )
    .await
    .assert_status(StatusCode::TOO_MANY_REQUESTS);

    forwarded_for(
        with_bearer(
            app.server.delete("/api/auth/session"),
            SupabaseTestData::VALID_TOKEN,
        ),
        "198.51.100.20",
    )
    .await
    .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_trusted_proxy() {
    let app = TestApp::spawn().await;

    let first = forwarded_for(app.server.get("/api/hello"), "203.0.113.10").await;
    let second = forwarded_for(app.server.get("/api/hello"), "198.51.100.20").await;

    assert_eq!(header_u64(&first, "ratelimit-remaining"), 99);
    assert_eq!(header_u64(&second, "ratelimit-remaining"), 98);
}

#[tokio::test]
async fn test_redis_counters_are_enforced() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let app = TestApp::spawn_with(&[
        ("RATE_LIMIT_REDIS_URL", "redis://127.0.0.1:6379"),
        ("TRUST_PROXY", "true"),
    ])
    .await;
    let client = unique_client("sensitive");

    for _ in 0..5 {
        forwarded_for(
            with_bearer(
                app.server.delete("/api/auth/session"),
                SupabaseTestData::VALID_TOKEN,
            ),
            &client,
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
    }

    let response = forwarded_for(
        with_bearer(
            app.server.delete("/api/auth/session"),
            SupabaseTestData::VALID_TOKEN,
        ),
        &client,
    )
    .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.json::<Value>()["code"],
        "SENSITIVE_RATE_LIMIT_EXCEEDED"
    );
}
