//! Rate limiting module
//!
//! Fixed-window request counting keyed by (endpoint, client identity), with
//! window state held in the injected counter store so limits hold across
//! horizontally-scaled workers. Two limiter instances run in production:
//!
//! - **WindowLimiter**: the general per-rate-class limiter
//! - **FraudGuard**: a stricter, independently configured instance under a
//!   disjoint key namespace, applied only to the card-creation endpoint
//!
//! Store failures resolve per the named fail-open policy: log and allow
//! rather than turning an infrastructure hiccup into user-facing 500s.

pub mod fraud;
pub mod limiter;
pub mod types;

pub use fraud::FraudGuard;
pub use limiter::WindowLimiter;
pub use types::{Namespace, RateClass, RateLimitConfig, RateLimitKey, RateLimitResult};
