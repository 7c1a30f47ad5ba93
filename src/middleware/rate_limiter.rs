//! Rate limiting middleware
//!
//! Fixed-window request counting per client key. Each limiter owns its own
//! counter store, so tiers never share counts. Responses carry the standard
//! `RateLimit-*` headers; legacy `X-RateLimit-*` headers are never sent.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::{
    error::ErrorBody,
    routes::metrics,
    store::{MemoryStore, RateLimitStore, WindowState},
};

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

/// Named rate-limit configuration
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitTier {
    name: String,
    window: Duration,
    max_requests: u64,
    message: ErrorBody,
}

impl RateLimitTier {
    pub fn new(name: impl Into<String>, window: Duration, max_requests: u64, message: ErrorBody) -> Self {
        Self {
            name: name.into(),
            window,
            max_requests,
            message,
        }
    }

    /// General API endpoints: 100 requests per 15 minutes
    pub fn general() -> Self {
        Self::new(
            "general",
            FIFTEEN_MINUTES,
            100,
            ErrorBody::new(
                "Too Many Requests",
                "RATE_LIMIT_EXCEEDED",
                "Too many requests from this IP, please try again later",
            ),
        )
    }

    /// Authentication endpoints: 10 requests per 15 minutes
    pub fn auth() -> Self {
        Self::new(
            "auth",
            FIFTEEN_MINUTES,
            10,
            ErrorBody::new(
                "Too Many Requests",
                "AUTH_RATE_LIMIT_EXCEEDED",
                "Too many authentication attempts, please try again later",
            ),
        )
    }

    /// Sensitive operations: 5 requests per hour
    pub fn sensitive() -> Self {
        Self::new(
            "sensitive",
            ONE_HOUR,
            5,
            ErrorBody::new(
                "Too Many Requests",
                "SENSITIVE_RATE_LIMIT_EXCEEDED",
                "Too many sensitive operation attempts, please try again later",
            ),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn message(&self) -> &ErrorBody {
        &self.message
    }
}

/// How the client key is derived from a request
#[derive(Clone)]
pub enum KeyExtractor {
    /// Source address of the TCP connection
    PeerIp,
    /// First `X-Forwarded-For` entry, falling back to the peer address
    ForwardedFor,
    /// Caller-supplied function
    Custom(Arc<dyn Fn(&Request) -> String + Send + Sync>),
}

impl fmt::Debug for KeyExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyExtractor::PeerIp => f.write_str("PeerIp"),
            KeyExtractor::ForwardedFor => f.write_str("ForwardedFor"),
            KeyExtractor::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl KeyExtractor {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        KeyExtractor::Custom(Arc::new(f))
    }

    /// Key for `request`; `unknown` when no address is available
    pub fn key_for(&self, request: &Request) -> String {
        match self {
            KeyExtractor::PeerIp => peer_ip(request),
            KeyExtractor::ForwardedFor => forwarded_for(request.headers())
                .unwrap_or_else(|| peer_ip(request)),
            KeyExtractor::Custom(f) => f(request),
        }
    }
}

fn peer_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Ceiling for the window
    pub limit: u64,
    /// Requests left in the window
    pub remaining: u64,
    /// Time until the window resets
    pub reset_after: Duration,
}

impl RateLimitDecision {
    fn from_window(state: WindowState, limit: u64) -> Self {
        Self {
            allowed: state.count <= limit,
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_after: state.reset_after,
        }
    }

    /// Whole seconds until reset, rounded up
    pub fn reset_seconds(&self) -> u64 {
        let millis = self.reset_after.as_millis() as u64;
        millis.div_ceil(1000)
    }

    /// Rate limit headers for the response
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (RATELIMIT_LIMIT, HeaderValue::from(self.limit)),
            (RATELIMIT_REMAINING, HeaderValue::from(self.remaining)),
            (RATELIMIT_RESET, HeaderValue::from(self.reset_seconds())),
        ];

        if !self.allowed {
            headers.push((header::RETRY_AFTER, HeaderValue::from(self.reset_seconds())));
        }

        headers
    }

    fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.headers() {
            headers.insert(name, value);
        }
    }
}

/// Rate limiter for one tier
#[derive(Clone)]
pub struct RateLimiter {
    tier: Arc<RateLimitTier>,
    store: Arc<dyn RateLimitStore>,
    key_extractor: KeyExtractor,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tier", &self.tier)
            .field("store", &self.store.name())
            .field("key_extractor", &self.key_extractor)
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter with its own in-process store, keyed by peer address
    pub fn new(tier: RateLimitTier) -> Self {
        Self {
            tier: Arc::new(tier),
            store: Arc::new(MemoryStore::new()),
            key_extractor: KeyExtractor::PeerIp,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_key_extractor(mut self, key_extractor: KeyExtractor) -> Self {
        self.key_extractor = key_extractor;
        self
    }

    pub fn tier(&self) -> &RateLimitTier {
        &self.tier
    }

    /// Client key for `request`
    pub fn client_key(&self, request: &Request) -> String {
        self.key_extractor.key_for(request)
    }

    /// Count one request for `client_key`
    ///
    /// Returns `None` when the store fails; the caller admits the request.
    pub async fn admit(&self, client_key: &str) -> Option<RateLimitDecision> {
        match self.store.hit(client_key, self.tier.window).await {
            Ok(state) => Some(RateLimitDecision::from_window(state, self.tier.max_requests)),
            Err(e) => {
                error!(
                    error = %e,
                    tier = %self.tier.name,
                    store = self.store.name(),
                    "Rate limit check failed"
                );
                None
            }
        }
    }
}

/// Optional overrides for [`create_rate_limiter`]
///
/// Anything left unset takes the general tier's value.
#[derive(Default, Clone)]
pub struct RateLimitOptions {
    pub name: Option<String>,
    pub window: Option<Duration>,
    pub max_requests: Option<u64>,
    pub message: Option<ErrorBody>,
    pub store: Option<Arc<dyn RateLimitStore>>,
    pub key_extractor: Option<KeyExtractor>,
}

/// Build an ad-hoc rate limiter on top of the general tier defaults
pub fn create_rate_limiter(options: RateLimitOptions) -> RateLimiter {
    let defaults = RateLimitTier::general();
    let tier = RateLimitTier::new(
        options.name.unwrap_or(defaults.name),
        options.window.unwrap_or(defaults.window),
        options.max_requests.unwrap_or(defaults.max_requests),
        options.message.unwrap_or(defaults.message),
    );

    let mut limiter = RateLimiter::new(tier);
    if let Some(store) = options.store {
        limiter = limiter.with_store(store);
    }
    if let Some(key_extractor) = options.key_extractor {
        limiter = limiter.with_key_extractor(key_extractor);
    }
    limiter
}

/// The three pre-built limiters
#[derive(Clone, Debug)]
pub struct RateLimiters {
    pub general: RateLimiter,
    pub auth: RateLimiter,
    pub sensitive: RateLimiter,
}

impl RateLimiters {
    /// In-process limiters, each with its own store
    pub fn in_memory(key_extractor: KeyExtractor) -> Self {
        Self {
            general: RateLimiter::new(RateLimitTier::general())
                .with_key_extractor(key_extractor.clone()),
            auth: RateLimiter::new(RateLimitTier::auth()).with_key_extractor(key_extractor.clone()),
            sensitive: RateLimiter::new(RateLimitTier::sensitive())
                .with_key_extractor(key_extractor),
        }
    }

    /// Limiters sharing counters through Redis, one key prefix per tier
    pub fn redis(conn: redis::aio::ConnectionManager, key_extractor: KeyExtractor) -> Self {
        let build = |tier: RateLimitTier| {
            let store = crate::store::RedisStore::new(
                conn.clone(),
                crate::store::redis::keys::tier_prefix(tier.name()),
            );
            RateLimiter::new(tier)
                .with_store(Arc::new(store))
                .with_key_extractor(key_extractor.clone())
        };

        Self {
            general: build(RateLimitTier::general()),
            auth: build(RateLimitTier::auth()),
            sensitive: build(RateLimitTier::sensitive()),
        }
    }
}

/// Build a 429 Too Many Requests response with rate limit headers
pub fn rate_limit_exceeded_response(tier: &RateLimitTier, decision: &RateLimitDecision) -> Response {
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(tier.message.clone())).into_response();
    decision.apply(response.headers_mut());
    response
}

/// Rate limiting middleware
///
/// Counts the request against the limiter's tier. Returns 429 once the
/// ceiling is exceeded and adds rate limit headers to every response.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client_key = limiter.client_key(&request);

    let Some(decision) = limiter.admit(&client_key).await else {
        // Store failure: fail open
        return next.run(request).await;
    };

    if !decision.allowed {
        warn!(
            tier = %limiter.tier.name,
            client = %client_key,
            limit = decision.limit,
            "Rate limit exceeded"
        );
        metrics::record_rate_limited(&limiter.tier.name);
        return rate_limit_exceeded_response(&limiter.tier, &decision);
    }

    let mut response = next.run(request).await;
    decision.apply(response.headers_mut());
    response
}
