use crate::admission::policy::{CachePolicy, RoutePolicy};
use crate::error::{ApiError, Result};
use crate::rate_limit::types::{RateClass, RateLimitConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream sports-data provider
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Counter store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Origin allow-list
    #[serde(default)]
    pub origins: OriginsConfig,
    /// Per-rate-class limiter thresholds
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
    /// Declarative route policy table consumed by the admission layer.
    /// Changing a threshold or toggling an origin check is a one-line edit
    /// here, never a per-handler change.
    #[serde(default = "default_routes")]
    pub routes: Vec<RoutePolicy>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Upstream data provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the sports data API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Asset URL prefix the image proxy will forward to; anything else is
    /// rejected
    #[serde(default = "default_asset_base")]
    pub asset_base: String,
}

/// Counter store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection; when absent the service runs on the process-local
    /// store, a degraded mode whose limits only hold per worker
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Fail-open policy: on store failure, admit the request and log rather
    /// than reject
    #[serde(default = "default_true")]
    pub fail_open: bool,
    /// Chance per request that the local store sweeps expired windows
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,
    /// Bound on any single store round trip, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
}

/// Origin allow-list configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OriginsConfig {
    /// Exact-match origins (scheme + host + port); the first entry is the
    /// canonical default echoed to non-allow-listed callers
    #[serde(default)]
    pub allowed: Vec<String>,
    /// Append the local development origins to the list
    #[serde(default)]
    pub include_dev_origins: bool,
}

impl OriginsConfig {
    /// The effective allow-list, in configured order
    pub fn allow_list(&self) -> Vec<String> {
        let mut origins = self.allowed.clone();
        if self.include_dev_origins {
            for dev in [
                "http://localhost:3000",
                "http://localhost:5173",
                "http://127.0.0.1:3000",
                "http://127.0.0.1:5173",
            ] {
                origins.push(dev.to_string());
            }
        }
        origins
    }
}

/// Limiter thresholds per rate class, plus the fraud guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    #[serde(default = "default_get_limit")]
    pub get: RateLimitConfig,
    #[serde(default = "default_post_limit")]
    pub post: RateLimitConfig,
    #[serde(default = "default_increment_limit")]
    pub increment: RateLimitConfig,
    /// Deliberately stricter than the increment class; the two never share
    /// window state
    #[serde(default = "default_fraud_limit")]
    pub fraud: RateLimitConfig,
}

impl RateLimitsConfig {
    /// Threshold configuration for a rate class
    pub fn for_class(&self, class: RateClass) -> &RateLimitConfig {
        match class {
            RateClass::Get => &self.get,
            RateClass::Post => &self.post,
            RateClass::Increment => &self.increment,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    30
}

fn default_api_base() -> String {
    "https://api-web.nhle.com/v1".to_string()
}

fn default_asset_base() -> String {
    "https://assets.nhle.com/".to_string()
}

fn default_sweep_probability() -> f64 {
    0.01
}

fn default_store_timeout_ms() -> u64 {
    2000
}

fn default_get_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests: 60,
        window_secs: 60,
    }
}

fn default_post_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests: 30,
        window_secs: 60,
    }
}

fn default_increment_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests: 10,
        window_secs: 60,
    }
}

fn default_fraud_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests: 3,
        window_secs: 300,
    }
}

fn default_routes() -> Vec<RoutePolicy> {
    vec![
        RoutePolicy {
            path: "/api/teams".to_string(),
            methods: vec!["GET".to_string()],
            rate_class: RateClass::Get,
            require_origin_check: false,
            fraud_guard: false,
            cache: CachePolicy::PublicShort,
        },
        RoutePolicy {
            path: "/api/roster".to_string(),
            methods: vec!["GET".to_string()],
            rate_class: RateClass::Get,
            require_origin_check: false,
            fraud_guard: false,
            cache: CachePolicy::PublicShort,
        },
        RoutePolicy {
            path: "/api/count".to_string(),
            methods: vec!["GET".to_string()],
            rate_class: RateClass::Get,
            require_origin_check: false,
            fraud_guard: false,
            cache: CachePolicy::PublicShort,
        },
        RoutePolicy {
            path: "/api/increment".to_string(),
            methods: vec!["POST".to_string()],
            rate_class: RateClass::Increment,
            require_origin_check: true,
            fraud_guard: true,
            cache: CachePolicy::NoStore,
        },
        RoutePolicy {
            path: "/api/image-proxy".to_string(),
            methods: vec!["GET".to_string()],
            rate_class: RateClass::Get,
            require_origin_check: false,
            fraud_guard: false,
            cache: CachePolicy::Asset,
        },
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            asset_base: default_asset_base(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis: None,
            fail_open: default_true(),
            sweep_probability: default_sweep_probability(),
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            get: default_get_limit(),
            post: default_post_limit(),
            increment: default_increment_limit(),
            fraud: default_fraud_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            store: StoreConfig::default(),
            origins: OriginsConfig::default(),
            rate_limits: RateLimitsConfig::default(),
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ApiError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.origins.allow_list().is_empty() {
            return Err(ApiError::Config(
                "Origin allow-list cannot be empty; configure origins.allowed or enable \
                 origins.include_dev_origins"
                    .to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.store.sweep_probability) {
            return Err(ApiError::Config(format!(
                "store.sweep_probability must be within 0..=1, got {}",
                self.store.sweep_probability
            )));
        }

        for limit in [
            &self.rate_limits.get,
            &self.rate_limits.post,
            &self.rate_limits.increment,
            &self.rate_limits.fraud,
        ] {
            if limit.requests == 0 {
                return Err(ApiError::Config(
                    "Rate limit requests must be > 0".to_string(),
                ));
            }
            if limit.window_secs == 0 {
                return Err(ApiError::Config(
                    "Rate limit window must be > 0".to_string(),
                ));
            }
        }

        for route in &self.routes {
            if route.path.is_empty() || !route.path.starts_with('/') {
                return Err(ApiError::Config(format!(
                    "Route path must start with '/': '{}'",
                    route.path
                )));
            }

            if route.methods.is_empty() {
                return Err(ApiError::Config(format!(
                    "Route must whitelist at least one method: {}",
                    route.path
                )));
            }

            for method in &route.methods {
                let method_upper = method.to_uppercase();
                if !["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD"]
                    .contains(&method_upper.as_str())
                {
                    return Err(ApiError::Config(format!(
                        "Invalid HTTP method '{}' for route: {}",
                        method, route.path
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080

origins:
  allowed:
    - "https://cards.example.com"
  include_dev_origins: true

rate_limits:
  get:
    requests: 60
    window_secs: 60
  fraud:
    requests: 3
    window_secs: 300

routes:
  - path: "/api/teams"
    methods: ["GET"]
    rate_class: get
  - path: "/api/increment"
    methods: ["POST"]
    rate_class: increment
    require_origin_check: true
    fraud_guard: true
    cache: no_store
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.rate_limits.fraud.requests, 3);
        assert_eq!(config.rate_limits.fraud.window_secs, 300);
        assert!(config.routes[1].fraud_guard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limits.get.requests, 60);
        assert_eq!(config.rate_limits.increment.requests, 10);
        assert_eq!(config.routes.len(), 5);
        assert!(config.store.fail_open);
        assert!(config.store.redis.is_none());
    }

    #[test]
    fn test_dev_origins_appended() {
        let origins = OriginsConfig {
            allowed: vec!["https://cards.example.com".to_string()],
            include_dev_origins: true,
        };

        let list = origins.allow_list();
        assert_eq!(list[0], "https://cards.example.com");
        assert!(list.contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_allow_list() {
        let mut config = AppConfig::default();
        config.origins = OriginsConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = AppConfig::default();
        config.origins.include_dev_origins = true;
        config.rate_limits.get.requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_method() {
        let mut config = AppConfig::default();
        config.origins.include_dev_origins = true;
        config.routes[0].methods = vec!["FETCH".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sweep_probability() {
        let mut config = AppConfig::default();
        config.origins.include_dev_origins = true;
        config.store.sweep_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_class_lookup() {
        let limits = RateLimitsConfig::default();
        assert_eq!(limits.for_class(RateClass::Get).requests, 60);
        assert_eq!(limits.for_class(RateClass::Post).requests, 30);
        assert_eq!(limits.for_class(RateClass::Increment).requests, 10);
    }
}
