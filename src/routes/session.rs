//! Authenticated session endpoints
//!
//! Every handler here sits behind `require_auth`, so the principal is
//! always present in request extensions.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{middleware::auth::AuthenticatedUser, supabase::Principal};

/// Session creation response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Principal,
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated principal", body = Principal),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorBody)
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<Principal> {
    Json(user)
}

/// Start a session
#[utoipa::path(
    post,
    path = "/api/auth/session",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token accepted", body = SessionResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 429, description = "Too many authentication attempts", body = crate::error::ErrorBody)
    )
)]
pub async fn create_session(AuthenticatedUser(user): AuthenticatedUser) -> Json<SessionResponse> {
    info!(user_id = %user.id, "Session started");

    Json(SessionResponse {
        authenticated: true,
        user,
    })
}

/// End a session
#[utoipa::path(
    delete,
    path = "/api/auth/session",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 429, description = "Too many sensitive operation attempts", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_session(AuthenticatedUser(user): AuthenticatedUser) -> StatusCode {
    info!(user_id = %user.id, "Session ended");
    StatusCode::NO_CONTENT
}
