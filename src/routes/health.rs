//! Health check endpoints
//!
//! - `/api/health` - Server status with timestamp
//! - `/api/health/live` - Liveness probe

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Milliseconds since the Unix epoch
    #[schema(example = 1_700_000_000_000i64)]
    pub timestamp: i64,
    #[schema(example = "Server is running")]
    pub message: String,
}

/// Liveness probe response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LivenessResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorBody)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        message: "Server is running".to_string(),
    })
}

/// Liveness probe
///
/// Not rate limited; used by container orchestration.
#[utoipa::path(
    get,
    path = "/api/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is alive", body = LivenessResponse))
)]
pub async fn liveness_check() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
    })
}
