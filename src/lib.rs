//! Gatehouse - authenticated, rate-limited API server
//!
//! This library provides the request pipeline for the Gatehouse server:
//! bearer-token authentication against an external auth provider and
//! tiered fixed-window rate limiting.

pub mod config;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod supabase;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

pub use crate::config::Config;
pub use crate::middleware::rate_limiter::{KeyExtractor, RateLimiter, RateLimiters};
pub use crate::supabase::{AuthProvider, Principal, TokenVerifier};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub start_time: Instant,
    /// Lazily constructed token verifier
    pub auth_provider: Arc<AuthProvider>,
    /// Pre-built limiters, one store each
    pub rate_limiters: RateLimiters,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .build()?;

        let auth_provider = Arc::new(AuthProvider::from_config(&config, http_client.clone()));

        let key_extractor = key_extractor_for(&config);
        let rate_limiters = match &config.rate_limit_redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                let conn = redis::aio::ConnectionManager::new(client).await?;
                info!("Rate limit counters stored in Redis");
                RateLimiters::redis(conn, key_extractor)
            }
            None => RateLimiters::in_memory(key_extractor),
        };

        Ok(Self {
            config,
            http_client,
            start_time: Instant::now(),
            auth_provider,
            rate_limiters,
        })
    }

    /// Create application state around an explicit token verifier
    ///
    /// Rate limiting uses in-process counters.
    pub fn with_verifier(config: Config, verifier: Arc<dyn TokenVerifier>) -> Self {
        let rate_limiters = RateLimiters::in_memory(key_extractor_for(&config));

        Self {
            config,
            http_client: reqwest::Client::new(),
            start_time: Instant::now(),
            auth_provider: Arc::new(AuthProvider::with_verifier(verifier)),
            rate_limiters,
        }
    }
}

fn key_extractor_for(config: &Config) -> KeyExtractor {
    if config.trust_proxy {
        KeyExtractor::ForwardedFor
    } else {
        KeyExtractor::PeerIp
    }
}
