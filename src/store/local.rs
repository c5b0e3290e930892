use super::{CounterStore, WindowSlot};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Fixed-window state for one key
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    expires_at: u64,
}

/// Process-local counter store
///
/// A degraded fallback for deployments without Redis: windows are correct
/// only within a single worker's traffic. Staleness is handled lazily on
/// read (an expired entry counts as absent); a small configurable chance per
/// request additionally sweeps expired entries so the map stays bounded
/// without a timer thread.
pub struct LocalCounterStore {
    windows: DashMap<String, Window>,
    counters: DashMap<String, i64>,
    sweep_probability: f64,
}

impl LocalCounterStore {
    /// Create a local store with the given sweep probability (0.0 disables
    /// sweeping entirely; lazy expiry still applies)
    pub fn new(sweep_probability: f64) -> Self {
        Self {
            windows: DashMap::new(),
            counters: DashMap::new(),
            sweep_probability: sweep_probability.clamp(0.0, 1.0),
        }
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Increment the window for `key` as of `now`, resetting it first if the
    /// stored window has expired. The whole read-modify-write happens under
    /// the map's entry guard, so concurrent requests for one key serialize.
    fn incr_window_at(&self, key: &str, window_secs: u64, now: u64) -> WindowSlot {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + window_secs,
        });

        if entry.expires_at <= now {
            debug!(key, "Window expired, starting fresh");
            entry.count = 0;
            entry.expires_at = now + window_secs;
        }

        entry.count += 1;

        WindowSlot {
            count: entry.count,
            reset_after: entry.expires_at.saturating_sub(now).max(1),
        }
    }

    /// Opportunistically prune expired windows
    fn maybe_sweep(&self, now: u64) {
        if self.sweep_probability <= 0.0 || rand::random::<f64>() >= self.sweep_probability {
            return;
        }

        let before = self.windows.len();
        self.windows.retain(|_, w| w.expires_at > now);
        let after = self.windows.len();

        if before != after {
            debug!(pruned = before - after, "Swept expired limiter windows");
        }
    }

    /// Number of live window entries (for tests and monitoring)
    pub fn active_windows(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl CounterStore for LocalCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.counters.get(key).map(|v| *v))
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowSlot> {
        let now = Self::now_secs();
        let slot = self.incr_window_at(key, window_secs, now);
        self.maybe_sweep(now);
        Ok(slot)
    }
}
