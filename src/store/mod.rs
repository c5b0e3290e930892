//! Counter store abstraction
//!
//! Both the rate limiter windows and the public card counter live behind the
//! [`CounterStore`] trait. Two implementations exist:
//!
//! - [`RedisCounterStore`]: shared Redis state, correct across workers
//! - [`LocalCounterStore`]: process-local map, an explicitly configured
//!   degraded fallback whose guarantees only hold within a single worker
//!
//! The store is passed as a constructed dependency into the admission layer,
//! never reached through a module-level singleton.

pub mod local;
pub mod lua_scripts;
pub mod redis;

pub use local::LocalCounterStore;
pub use redis::RedisCounterStore;

use crate::error::Result;
use async_trait::async_trait;

/// State of a fixed window after an increment has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlot {
    /// Request count within the current window, including this request
    pub count: u64,
    /// Seconds until the window expires
    pub reset_after: u64,
}

/// Atomically-incrementable integer store with per-key TTL support
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a counter; `None` if the key has never been incremented
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Atomically increment a persistent counter and return the new value.
    /// Concurrent callers each observe a distinct result.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Atomically increment a fixed-window counter, creating or resetting
    /// the window if absent or expired. The read-modify-write happens in a
    /// single step; a separate read-then-write would lose updates under
    /// concurrency.
    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowSlot>;
}
