//! Prometheus metrics endpoint
//!
//! Exposes authentication and rate limiting counters in Prometheus format.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;

    metrics::describe_counter!(
        "gatehouse_auth_attempts_total",
        "Authentication attempts by outcome"
    );
    metrics::describe_counter!(
        "gatehouse_rate_limited_total",
        "Requests rejected by a rate limiter, by tier"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record an authentication attempt
pub fn record_auth_outcome(outcome: &str) {
    metrics::counter!("gatehouse_auth_attempts_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a request rejected by a rate limiter
pub fn record_rate_limited(tier: &str) {
    metrics::counter!("gatehouse_rate_limited_total", "tier" => tier.to_string()).increment(1);
}
