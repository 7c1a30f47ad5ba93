//! Process-wide auth provider handle
//!
//! The verification client is built on first use and reused afterwards.
//! Construction happens at most once; a failed construction (missing or
//! malformed credentials) is retried on the next call.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::config::{Config, ConfigError};
use crate::supabase::client::{ProviderError, SupabaseAuthClient, TokenVerifier};

/// Lazily constructed handle to the token verifier
pub struct AuthProvider {
    config: Option<Config>,
    http_client: reqwest::Client,
    verifier: OnceCell<Arc<dyn TokenVerifier>>,
}

impl AuthProvider {
    /// Create a handle that builds the Supabase client from `config` on first use
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            config: Some(config.clone()),
            http_client,
            verifier: OnceCell::new(),
        }
    }

    /// Create a handle around an already constructed verifier
    pub fn with_verifier(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            config: None,
            http_client: reqwest::Client::new(),
            verifier: OnceCell::with_value(verifier),
        }
    }

    /// Whether the verifier has been constructed
    pub fn is_initialized(&self) -> bool {
        self.verifier.get().is_some()
    }

    /// Get the verifier, constructing it on first use
    pub fn verifier(&self) -> Result<Arc<dyn TokenVerifier>, ProviderError> {
        self.verifier
            .get_or_try_init(|| {
                let config = self
                    .config
                    .as_ref()
                    .ok_or(ConfigError::MissingProviderUrl)?;

                let credentials = config.provider_credentials().map_err(|e| {
                    error!(error = %e, "Auth provider configuration invalid");
                    e
                })?;

                info!(url = %credentials.url, "Auth provider client initialized");

                let client: Arc<dyn TokenVerifier> = Arc::new(SupabaseAuthClient::new(
                    self.http_client.clone(),
                    credentials,
                    Duration::from_secs(config.auth_timeout_seconds),
                ));
                Ok::<_, ProviderError>(client)
            })
            .cloned()
    }
}
