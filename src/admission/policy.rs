use crate::rate_limit::types::RateClass;
use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Cache-Control directive class for a route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Short public caching for read endpoints
    #[default]
    PublicShort,
    /// No caching for mutating endpoints
    NoStore,
    /// Long edge caching for proxied static assets
    Asset,
}

impl CachePolicy {
    /// The Cache-Control header value for this class
    pub fn header_value(&self) -> &'static str {
        match self {
            CachePolicy::PublicShort => "public, max-age=60, s-maxage=300",
            CachePolicy::NoStore => "no-store",
            CachePolicy::Asset => "s-maxage=86400, stale-while-revalidate=43200",
        }
    }
}

/// Admission policy for one route
///
/// All admission knobs for a route live here and nowhere else; handlers
/// never carry their own thresholds or origin-check literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Request path, exact match
    pub path: String,
    /// Method whitelist (OPTIONS is always handled as CORS preflight and
    /// never listed here)
    pub methods: Vec<String>,
    /// Which limiter threshold class applies
    pub rate_class: RateClass,
    /// Whether origin validation gates this route
    #[serde(default)]
    pub require_origin_check: bool,
    /// Whether the fraud guard additionally gates this route
    #[serde(default)]
    pub fraud_guard: bool,
    /// Cache-Control class for responses from this route
    #[serde(default)]
    pub cache: CachePolicy,
}

impl RoutePolicy {
    /// Whether `method` is whitelisted for this route
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }
}

/// The declarative route policy table consumed by the admission dispatcher
#[derive(Debug, Clone)]
pub struct PolicyTable {
    routes: Vec<RoutePolicy>,
}

impl PolicyTable {
    pub fn new(routes: Vec<RoutePolicy>) -> Self {
        Self { routes }
    }

    /// Look up the policy for a request path
    pub fn lookup(&self, path: &str) -> Option<&RoutePolicy> {
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn routes(&self) -> &[RoutePolicy] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy() -> RoutePolicy {
        RoutePolicy {
            path: "/api/increment".to_string(),
            methods: vec!["POST".to_string()],
            rate_class: RateClass::Increment,
            require_origin_check: true,
            fraud_guard: true,
            cache: CachePolicy::NoStore,
        }
    }

    #[test]
    fn test_method_whitelist() {
        let policy = sample_policy();
        assert!(policy.allows_method(&Method::POST));
        assert!(!policy.allows_method(&Method::GET));
        assert!(!policy.allows_method(&Method::DELETE));
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = PolicyTable::new(vec![sample_policy()]);
        assert!(table.lookup("/api/increment").is_some());
        assert!(table.lookup("/api/increment/").is_none());
        assert!(table.lookup("/api/count").is_none());
    }

    #[test]
    fn test_cache_header_values() {
        assert_eq!(
            CachePolicy::PublicShort.header_value(),
            "public, max-age=60, s-maxage=300"
        );
        assert_eq!(CachePolicy::NoStore.header_value(), "no-store");
    }
}
