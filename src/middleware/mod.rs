//! Request middleware
//!
//! Bearer-token authentication and tiered rate limiting. Routes apply the
//! rate limiter first, so rejected clients never reach the auth provider.

pub mod auth;
pub mod rate_limiter;

pub use auth::{require_auth, AuthenticatedUser};
pub use rate_limiter::{create_rate_limiter, rate_limit, RateLimitOptions, RateLimitTier};
