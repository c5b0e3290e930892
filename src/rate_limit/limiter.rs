use super::types::{RateLimitConfig, RateLimitKey, RateLimitResult};
use crate::store::CounterStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Fixed-window rate limiter
///
/// Counts requests per key within discrete, non-overlapping windows held in
/// the injected [`CounterStore`]. Bursts straddling a window boundary can
/// momentarily admit up to twice the threshold; that is a known
/// characteristic of fixed windows, accepted here for simplicity.
pub struct WindowLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
    /// Named policy: on store failure, allow the request and log instead of
    /// rejecting. Availability of the product wins over strict quota
    /// enforcement for this abuse-mitigation layer.
    fail_open: bool,
    /// Upper bound on any single store round trip
    store_timeout: Duration,
}

impl WindowLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        config: RateLimitConfig,
        fail_open: bool,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            config,
            fail_open,
            store_timeout,
        }
    }

    /// Check whether a request identified by `key` is within quota
    ///
    /// Out-of-quota is a normal denied result, not an error. Store failures
    /// (including timeouts) resolve via the fail-open policy and are
    /// observable only through logs.
    pub async fn check(&self, key: &RateLimitKey) -> RateLimitResult {
        let store_key = key.to_store_key();

        let outcome = tokio::time::timeout(
            self.store_timeout,
            self.store.incr_window(&store_key, self.config.window_secs),
        )
        .await;

        let slot = match outcome {
            Ok(Ok(slot)) => slot,
            Ok(Err(e)) => {
                return self.on_store_failure(&store_key, &e.to_string());
            }
            Err(_) => {
                return self.on_store_failure(&store_key, "store call timed out");
            }
        };

        let remaining = (self.config.requests as i64 - slot.count as i64).max(0);

        if slot.count <= self.config.requests as u64 {
            debug!(key = %store_key, remaining, "Rate limit check passed");
            RateLimitResult::allowed(remaining, self.config.requests, slot.reset_after)
        } else {
            warn!(key = %store_key, count = slot.count, "Rate limit exceeded");
            RateLimitResult::denied(self.config.requests, self.config.window_secs)
        }
    }

    fn on_store_failure(&self, key: &str, reason: &str) -> RateLimitResult {
        if self.fail_open {
            error!(key, reason, "Counter store failure, failing open");
            RateLimitResult::allowed(
                self.config.requests as i64,
                self.config.requests,
                self.config.window_secs,
            )
        } else {
            error!(key, reason, "Counter store failure, failing closed");
            RateLimitResult::denied(self.config.requests, self.config.window_secs)
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, Result};
    use crate::store::{LocalCounterStore, WindowSlot};
    use async_trait::async_trait;

    fn limiter(requests: u32, window_secs: u64) -> WindowLimiter {
        WindowLimiter::new(
            Arc::new(LocalCounterStore::new(0.0)),
            RateLimitConfig {
                requests,
                window_secs,
            },
            true,
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn test_sequential_requests_count_down_remaining() {
        let limiter = limiter(10, 60);
        let key = RateLimitKey::general("/api/teams", "203.0.113.7");

        for expected_remaining in (0..10).rev() {
            let result = limiter.check(&key).await;
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
            assert_eq!(result.limit, 10);
        }

        let result = limiter.check(&key).await;
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.retry_after, Some(60));
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let limiter = limiter(2, 1);
        let key = RateLimitKey::general("/api/teams", "203.0.113.8");

        for _ in 0..2 {
            assert!(limiter.check(&key).await.allowed);
        }
        assert!(!limiter.check(&key).await.allowed);

        tokio::time::sleep(Duration::from_secs(2)).await;

        let result = limiter.check(&key).await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 1);
    }

    #[tokio::test]
    async fn test_general_and_fraud_namespaces_isolated() {
        let store: Arc<dyn CounterStore> = Arc::new(LocalCounterStore::new(0.0));
        let general = WindowLimiter::new(
            store.clone(),
            RateLimitConfig {
                requests: 2,
                window_secs: 60,
            },
            true,
            Duration::from_secs(2),
        );
        let fraud = WindowLimiter::new(
            store,
            RateLimitConfig {
                requests: 3,
                window_secs: 300,
            },
            true,
            Duration::from_secs(2),
        );

        let general_key = RateLimitKey::general("/api/increment", "198.51.100.4");
        let fraud_key = RateLimitKey::fraud("/api/increment", "198.51.100.4");

        // Exhaust the general limiter for this client
        for _ in 0..2 {
            assert!(general.check(&general_key).await.allowed);
        }
        assert!(!general.check(&general_key).await.allowed);

        // The fraud counter for the same client is untouched
        let result = fraud.check(&fraud_key).await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
    }

    struct FailingStore;

    #[async_trait]
    impl CounterStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<i64>> {
            Err(ApiError::Store("connection refused".to_string()))
        }

        async fn incr(&self, _key: &str) -> Result<i64> {
            Err(ApiError::Store("connection refused".to_string()))
        }

        async fn incr_window(&self, _key: &str, _window_secs: u64) -> Result<WindowSlot> {
            Err(ApiError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fail_open_allows_on_store_failure() {
        let limiter = WindowLimiter::new(
            Arc::new(FailingStore),
            RateLimitConfig {
                requests: 10,
                window_secs: 60,
            },
            true,
            Duration::from_secs(2),
        );

        let key = RateLimitKey::general("/api/teams", "203.0.113.9");
        let result = limiter.check(&key).await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 10);
    }

    #[tokio::test]
    async fn test_fail_closed_denies_on_store_failure() {
        let limiter = WindowLimiter::new(
            Arc::new(FailingStore),
            RateLimitConfig {
                requests: 10,
                window_secs: 60,
            },
            false,
            Duration::from_secs(2),
        );

        let key = RateLimitKey::general("/api/teams", "203.0.113.9");
        let result = limiter.check(&key).await;
        assert!(!result.allowed);
        assert_eq!(result.retry_after, Some(60));
    }

    struct HangingStore;

    #[async_trait]
    impl CounterStore for HangingStore {
        async fn get(&self, _key: &str) -> Result<Option<i64>> {
            std::future::pending().await
        }

        async fn incr(&self, _key: &str) -> Result<i64> {
            std::future::pending().await
        }

        async fn incr_window(&self, _key: &str, _window_secs: u64) -> Result<WindowSlot> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_store_timeout_triggers_fail_open() {
        let limiter = WindowLimiter::new(
            Arc::new(HangingStore),
            RateLimitConfig {
                requests: 10,
                window_secs: 60,
            },
            true,
            Duration::from_millis(50),
        );

        let key = RateLimitKey::general("/api/teams", "203.0.113.10");
        let result = limiter.check(&key).await;
        assert!(result.allowed);
    }
}
