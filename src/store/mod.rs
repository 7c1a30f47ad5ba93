//! Rate-limit counter stores
//!
//! A store owns the per-client counters of one rate limiter. The in-process
//! store is the default; the Redis store shares counters between instances.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Counter state after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Requests counted in the current window, including this one
    pub count: u64,
    /// Time until the current window resets
    pub reset_after: Duration,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Fixed-window counter storage
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Count one request for `key` and return the resulting window state.
    ///
    /// Check-and-increment must be a single atomic step: two concurrent hits
    /// for the same key always observe distinct counts.
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, StoreError>;

    /// Forget the counter for `key`
    async fn reset(&self, key: &str) -> Result<(), StoreError>;
}
