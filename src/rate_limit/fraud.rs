use super::limiter::WindowLimiter;
use super::types::{RateLimitConfig, RateLimitKey, RateLimitResult};
use crate::store::CounterStore;
use std::sync::Arc;
use std::time::Duration;

/// Secondary limiter applied only to the card-creation endpoint
///
/// Runs a second [`WindowLimiter`] under the disjoint `fraud:` key namespace
/// with its own, materially stricter threshold and window, so tightening
/// either limiter never silently affects the other.
pub struct FraudGuard {
    limiter: WindowLimiter,
}

impl FraudGuard {
    pub fn new(
        store: Arc<dyn CounterStore>,
        config: RateLimitConfig,
        fail_open: bool,
        store_timeout: Duration,
    ) -> Self {
        Self {
            limiter: WindowLimiter::new(store, config, fail_open, store_timeout),
        }
    }

    /// Check the fraud counter for this endpoint and client
    pub async fn check(&self, endpoint: &str, client: &str) -> RateLimitResult {
        let key = RateLimitKey::fraud(endpoint, client);
        self.limiter.check(&key).await
    }

    /// The fraud window length, surfaced as `retryAfter` on rejection
    pub fn window_secs(&self) -> u64 {
        self.limiter.config().window_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalCounterStore;

    #[tokio::test]
    async fn test_strict_threshold_applies() {
        let guard = FraudGuard::new(
            Arc::new(LocalCounterStore::new(0.0)),
            RateLimitConfig {
                requests: 3,
                window_secs: 300,
            },
            true,
            Duration::from_secs(2),
        );

        for _ in 0..3 {
            assert!(guard.check("/api/increment", "198.51.100.9").await.allowed);
        }

        let result = guard.check("/api/increment", "198.51.100.9").await;
        assert!(!result.allowed);
        assert_eq!(result.retry_after, Some(300));
        assert_eq!(guard.window_secs(), 300);
    }

    #[tokio::test]
    async fn test_clients_tracked_independently() {
        let guard = FraudGuard::new(
            Arc::new(LocalCounterStore::new(0.0)),
            RateLimitConfig {
                requests: 1,
                window_secs: 300,
            },
            true,
            Duration::from_secs(2),
        );

        assert!(guard.check("/api/increment", "a").await.allowed);
        assert!(!guard.check("/api/increment", "a").await.allowed);
        assert!(guard.check("/api/increment", "b").await.allowed);
    }
}
