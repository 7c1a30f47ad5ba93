//! In-process counter store
//!
//! Counters live in a mutex-guarded map. The lock is never held across an
//! await, which makes each hit atomic with respect to other requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::store::{RateLimitStore, StoreError, WindowState};

/// Expired counters are swept after this many hits
const SWEEP_INTERVAL: u64 = 1024;

/// Counter for a single client within its window
#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u64,
    window_start: Instant,
    window: Duration,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }
}

/// In-memory counter store
///
/// Limits are per process: separate server instances keep separate counts.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, Counter>>,
    hits: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Counter>> {
        // A panic while holding the lock cannot leave a counter half-written.
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count one request for `key` at `now`
    pub fn hit_at(&self, key: &str, window: Duration, now: Instant) -> WindowState {
        if self.hits.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep_at(now);
        }

        let mut counters = self.lock();
        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            window_start: now,
            window,
        });

        if counter.is_expired(now) {
            counter.count = 0;
            counter.window_start = now;
            counter.window = window;
        }

        counter.count = counter.count.saturating_add(1);

        WindowState {
            count: counter.count,
            reset_after: counter
                .window
                .saturating_sub(now.saturating_duration_since(counter.window_start)),
        }
    }

    /// Drop counters whose window has elapsed
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut counters = self.lock();
        let before = counters.len();
        counters.retain(|_, counter| !counter.is_expired(now));
        let removed = before - counters.len();
        if removed > 0 {
            debug!(removed, remaining = counters.len(), "Swept expired rate-limit counters");
        }
        removed
    }

    /// Number of tracked clients
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn hit(&self, key: &str, window: Duration) -> Result<WindowState, StoreError> {
        Ok(self.hit_at(key, window, Instant::now()))
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}
