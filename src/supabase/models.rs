//! Auth provider data models
//!
//! Data structures for auth provider responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verified identity returned by the auth provider
///
/// Created per request by the authenticator and exposed read-only to
/// handlers through request extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Opaque user identifier
    #[schema(example = "8f14e45f-ceea-467f-a0e6-1a2b3c4d5e6f")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Provider-managed metadata
    #[serde(default)]
    #[schema(value_type = Object)]
    pub app_metadata: serde_json::Value,
    /// User-editable metadata
    #[serde(default)]
    #[schema(value_type = Object)]
    pub user_metadata: serde_json::Value,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: None,
            app_metadata: serde_json::Value::Null,
            user_metadata: serde_json::Value::Null,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Error payload returned by the auth provider
///
/// The provider has used several shapes over time (`msg`, `message`,
/// `error_description`), so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorPayload {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ProviderErrorPayload {
    /// Best-effort human readable message
    pub fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error_code.as_deref())
            .unwrap_or("unknown provider error")
    }
}
