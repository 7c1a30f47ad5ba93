//! Redis counter store
//!
//! Fixed-window counters shared by every instance pointing at the same Redis.
//! The window is created with `SET NX PX`, counted with `INCR` and read back
//! with `PTTL`, all inside one MULTI/EXEC so concurrent hits stay exact.

use std::time::Duration;

use async_trait::async_trait;
use ::redis::AsyncCommands;

use crate::store::{RateLimitStore, StoreError, WindowState};

/// Redis-backed counter store
pub struct RedisStore {
    conn: ::redis::aio::ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Create a store whose keys live under `prefix`
    pub fn new(conn: ::redis::aio::ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, client: &str) -> String {
        keys::counter(&self.prefix, client)
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);
        let window_ms = window.as_millis().max(1) as u64;

        let (count, pttl): (u64, i64) = ::redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .incr(&key, 1u64)
            .pttl(&key)
            .query_async(&mut conn)
            .await?;

        // Negative PTTL: no expiry set on the key
        let reset_after = if pttl > 0 {
            Duration::from_millis(pttl as u64)
        } else {
            window
        };

        Ok(WindowState { count, reset_after })
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await?;
        Ok(())
    }
}

/// Redis key layout
pub mod keys {
    /// Counter key for a client under a limiter prefix
    pub fn counter(prefix: &str, client: &str) -> String {
        format!("{}:{}", prefix, client)
    }

    /// Prefix used for a named tier
    pub fn tier_prefix(tier: &str) -> String {
        format!("gatehouse:ratelimit:{}", tier)
    }
}
