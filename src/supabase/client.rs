//! Auth provider client
//!
//! HTTP client for the Supabase auth API. Only token verification is used.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::{ConfigError, ProviderCredentials};
use crate::supabase::models::{Principal, ProviderErrorPayload};

/// Errors from the auth provider call
///
/// None of these reach a client; the authenticator folds all of them into a
/// rejected verification.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("auth provider is not configured: {0}")]
    Configuration(#[from] ConfigError),

    #[error("auth provider rejected the token ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("auth provider returned unexpected status {status}")]
    Status { status: u16 },

    #[error("auth provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse auth provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// External token verification call
///
/// `Ok(Some(principal))` means the provider vouched for the token,
/// `Ok(None)` means it answered without a user.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &'static str;

    /// Resolve the user owning `token`
    async fn get_user(&self, token: &str) -> Result<Option<Principal>, ProviderError>;
}

/// Supabase auth API client
pub struct SupabaseAuthClient {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
    timeout: Duration,
}

impl SupabaseAuthClient {
    /// Create a new auth client from validated credentials
    pub fn new(client: reqwest::Client, credentials: ProviderCredentials, timeout: Duration) -> Self {
        Self {
            client,
            base_url: credentials.url,
            service_role_key: credentials.service_role_key,
            timeout,
        }
    }

    /// Build headers identifying this server to the provider
    fn service_headers(&self, token: &str) -> Result<HeaderMap, ProviderError> {
        let invalid = |_| ProviderError::Rejected {
            status: 400,
            message: "token contains characters not allowed in a header".to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.service_role_key)
                .map_err(|_| ProviderError::Configuration(ConfigError::InvalidServiceRoleKey))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(invalid)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TokenVerifier for SupabaseAuthClient {
    fn name(&self) -> &'static str {
        "supabase"
    }

    #[instrument(skip_all, fields(provider = "supabase"))]
    async fn get_user(&self, token: &str) -> Result<Option<Principal>, ProviderError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        debug!(url = %url, token_len = token.len(), "Verifying token with auth provider");

        let response = self
            .client
            .get(&url)
            .headers(self.service_headers(token)?)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to auth provider");
                e
            })?;

        let status = response.status();
        debug!(status = %status, "Auth provider response status");

        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            let payload: ProviderErrorPayload = serde_json::from_str(&text).unwrap_or_default();
            debug!(status = %status, message = payload.message(), "Auth provider rejected token");
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: payload.message().to_string(),
            });
        }

        if !status.is_success() {
            error!(status = %status, "Auth provider request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let user: Option<Principal> = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse auth provider user response");
            e
        })?;

        if let Some(user) = &user {
            debug!(user_id = %user.id, "Token verified by auth provider");
        }
        Ok(user)
    }
}
