//! Configuration management for Gatehouse
//!
//! Configuration is loaded from environment variables. Auth provider
//! credentials are optional at load time and only validated when the
//! provider client is first needed.

use std::env;
use std::fmt;

use anyhow::{Context, Result};
use thiserror::Error;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("Invalid APP_ENV: {other}"),
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while validating auth provider credentials
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SUPABASE_URL is not defined. Set it to your project URL (https://YOUR-PROJECT.supabase.co)")]
    MissingProviderUrl,

    #[error("SUPABASE_SERVICE_ROLE_KEY is not defined. Copy the service_role key (NOT the anon key) from the project API settings")]
    MissingServiceRoleKey,

    #[error("SUPABASE_URL has invalid format: {0}. Expected: https://YOUR-PROJECT.supabase.co")]
    InvalidProviderUrl(String),

    #[error("SUPABASE_SERVICE_ROLE_KEY appears invalid. Expected a JWT starting with \"eyJ\"")]
    InvalidServiceRoleKey,
}

/// Validated credentials for the auth provider
#[derive(Clone)]
pub struct ProviderCredentials {
    pub url: String,
    pub service_role_key: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,

    /// Auth provider base URL
    pub supabase_url: Option<String>,
    /// Service role key sent to the auth provider
    pub supabase_service_role_key: Option<String>,
    /// Timeout for auth provider calls (in seconds)
    pub auth_timeout_seconds: u64,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,

    /// Redis URL for shared rate-limit counters; in-process counters when unset
    pub rate_limit_redis_url: Option<String>,
    /// Derive the client key from X-Forwarded-For
    pub trust_proxy: bool,

    /// Expose /api/debug routes
    pub debug_routes: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_service_role_key",
                &self.supabase_service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_timeout_seconds", &self.auth_timeout_seconds)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_redis_url", &self.rate_limit_redis_url)
            .field("trust_proxy", &self.trust_proxy)
            .field("debug_routes", &self.debug_routes)
            .finish()
    }
}

const DEV_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:3002",
];

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "yes")
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV") {
            Some(v) => Environment::parse(&v)?,
            None => Environment::Development,
        };

        let cors_origins = match lookup("CORS_ORIGIN") {
            Some(v) => v
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None if environment.is_production() => Vec::new(),
            None => DEV_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse()
                .context("Invalid PORT")?,
            environment,

            supabase_url: lookup("SUPABASE_URL").filter(|v| !v.is_empty()),
            supabase_service_role_key: lookup("SUPABASE_SERVICE_ROLE_KEY")
                .filter(|v| !v.is_empty()),
            auth_timeout_seconds: lookup("AUTH_TIMEOUT_SECONDS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("Invalid AUTH_TIMEOUT_SECONDS")?,

            cors_origins,

            rate_limit_redis_url: lookup("RATE_LIMIT_REDIS_URL").filter(|v| !v.is_empty()),
            trust_proxy: lookup("TRUST_PROXY")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            debug_routes: lookup("DEBUG_ROUTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(!environment.is_production()),
        })
    }

    /// Validate the auth provider credentials
    pub fn provider_credentials(&self) -> Result<ProviderCredentials, ConfigError> {
        let url = self
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::MissingProviderUrl)?;
        let service_role_key = self
            .supabase_service_role_key
            .as_deref()
            .ok_or(ConfigError::MissingServiceRoleKey)?;

        let hosted = url.starts_with("https://") && url.contains(".supabase.co");
        let local = url.starts_with("http://127.0.0.1") || url.starts_with("http://localhost");
        if !hosted && !local {
            return Err(ConfigError::InvalidProviderUrl(url.to_string()));
        }

        if !service_role_key.starts_with("eyJ") {
            return Err(ConfigError::InvalidServiceRoleKey);
        }

        Ok(ProviderCredentials {
            url: url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        })
    }
}
