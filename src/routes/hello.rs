//! Greeting endpoints

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Greeting response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HelloResponse {
    #[schema(example = "Hello, World!")]
    pub message: String,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Root greeting
#[utoipa::path(
    get,
    path = "/",
    tag = "Testing",
    responses((status = 200, description = "API is reachable", body = HelloResponse))
)]
pub async fn root() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello API".to_string(),
        timestamp: None,
    })
}

/// Hello world
#[utoipa::path(
    get,
    path = "/api/hello",
    tag = "Testing",
    responses(
        (status = 200, description = "Greeting", body = HelloResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorBody)
    )
)]
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello, World!".to_string(),
        timestamp: Some(chrono::Utc::now().timestamp_millis()),
    })
}
