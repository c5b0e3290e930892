use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate class - which limiter configuration applies to a route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RateClass {
    /// Read-only endpoints
    Get,
    /// General mutating endpoints
    Post,
    /// The card-creation counter endpoint
    Increment,
}

/// Key namespace - general limiter and fraud guard never share window state,
/// even for the same endpoint and client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Rate,
    Fraud,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Rate => "rate",
            Namespace::Fraud => "fraud",
        }
    }
}

/// Rate limit configuration for one rate class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed per window
    pub requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limit key components
///
/// Immutable once constructed for a request. The endpoint is the request
/// path (method-agnostic); the client identity comes from forwarded-for
/// headers with an `"unknown"` fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    /// Key namespace (general vs fraud)
    pub namespace: Namespace,
    /// Request path, without query string
    pub endpoint: String,
    /// Client identity (usually an IP address)
    pub client: String,
}

impl RateLimitKey {
    /// Create a key in the general rate namespace
    pub fn general(endpoint: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Rate,
            endpoint: endpoint.into(),
            client: client.into(),
        }
    }

    /// Create a key in the fraud namespace
    pub fn fraud(endpoint: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Fraud,
            endpoint: endpoint.into(),
            client: client.into(),
        }
    }

    /// Convert to a store key
    pub fn to_store_key(&self) -> String {
        format!("{}:{}:{}", self.namespace.as_str(), self.endpoint, self.client)
    }
}

/// Outcome of a limiter check
///
/// "Not allowed" is a normal return value here, never an error; store
/// failures are resolved inside the limiter per its fail-open policy.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: i64,
    /// Total limit
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_after: u64,
    /// Retry after duration for 429 responses
    pub retry_after: Option<u64>,
}

impl RateLimitResult {
    /// Create an allowed result
    pub fn allowed(remaining: i64, limit: u32, reset_after: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            limit,
            reset_after,
            retry_after: None,
        }
    }

    /// Create a denied result
    pub fn denied(limit: u32, retry_after: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            limit,
            reset_after: retry_after,
            retry_after: Some(retry_after),
        }
    }
}
