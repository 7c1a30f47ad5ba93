//! Error types for Gatehouse
//!
//! Every error the API returns is rendered as the same flat JSON body:
//! `{"error": ..., "code": ..., "details": ...}`. Details are static
//! guidance strings and never carry internal error text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const AUTH_REQUIRED_DETAILS: &str =
    "Valid JWT token required in Authorization header (format: \"Bearer <token>\")";
pub const INVALID_TOKEN_DETAILS: &str = "JWT token is invalid or expired";

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Resource not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Short title of the HTTP status
    #[schema(example = "Unauthorized")]
    pub error: String,
    /// Machine-readable error code
    #[schema(example = "AUTH_REQUIRED")]
    pub code: String,
    /// Human-readable guidance
    pub details: String,
}

impl ErrorBody {
    pub fn new(error: &str, code: &str, details: &str) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
            details: details.to_string(),
        }
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthRequired | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body for this error
    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::AuthRequired => {
                ErrorBody::new("Unauthorized", "AUTH_REQUIRED", AUTH_REQUIRED_DETAILS)
            }
            AppError::InvalidToken => {
                ErrorBody::new("Unauthorized", "INVALID_TOKEN", INVALID_TOKEN_DETAILS)
            }
            AppError::NotFound => ErrorBody::new(
                "Not Found",
                "NOT_FOUND",
                "The requested resource does not exist",
            ),
            AppError::BadRequest(msg) => ErrorBody::new("Bad Request", "BAD_REQUEST", msg),
            AppError::Internal(_) => ErrorBody::new(
                "Internal Server Error",
                "INTERNAL_ERROR",
                "Something went wrong",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            tracing::error!(error = %e, "Unhandled internal error");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
