//! Request admission control
//!
//! Every API route sits behind one pipeline, driven entirely by the
//! declarative route policy table:
//!
//! headers -> preflight short-circuit -> method whitelist -> origin check ->
//! general rate limit -> fraud guard (mutating route only) -> handler
//!
//! The first failing check produces the terminal response; rejected
//! responses still carry the full CORS/security header set. A request is
//! wholly admitted or wholly rejected before its handler runs.

pub mod headers;
pub mod origin;
pub mod policy;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::rate_limit::{FraudGuard, RateClass, RateLimitKey, WindowLimiter};
use crate::store::CounterStore;
use axum::{
    extract::Request,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use origin::OriginAllowList;
use policy::PolicyTable;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Admission control state shared across requests
///
/// Holds the policy table, the origin allow-list and the limiter instances.
/// The counter store is injected at construction; nothing here reaches for
/// global state.
#[derive(Clone)]
pub struct AdmissionControl {
    policies: Arc<PolicyTable>,
    origins: Arc<OriginAllowList>,
    get_limiter: Arc<WindowLimiter>,
    post_limiter: Arc<WindowLimiter>,
    increment_limiter: Arc<WindowLimiter>,
    fraud: Arc<FraudGuard>,
}

impl AdmissionControl {
    pub fn new(config: &AppConfig, store: Arc<dyn CounterStore>) -> Self {
        let fail_open = config.store.fail_open;
        let store_timeout = Duration::from_millis(config.store.timeout_ms);

        let limiter = |class: RateClass| {
            Arc::new(WindowLimiter::new(
                store.clone(),
                config.rate_limits.for_class(class).clone(),
                fail_open,
                store_timeout,
            ))
        };

        Self {
            policies: Arc::new(PolicyTable::new(config.routes.clone())),
            origins: Arc::new(OriginAllowList::new(config.origins.allow_list())),
            get_limiter: limiter(RateClass::Get),
            post_limiter: limiter(RateClass::Post),
            increment_limiter: limiter(RateClass::Increment),
            fraud: Arc::new(FraudGuard::new(
                store,
                config.rate_limits.fraud.clone(),
                fail_open,
                store_timeout,
            )),
        }
    }

    fn limiter_for(&self, class: RateClass) -> &WindowLimiter {
        match class {
            RateClass::Get => &self.get_limiter,
            RateClass::Post => &self.post_limiter,
            RateClass::Increment => &self.increment_limiter,
        }
    }

    /// Run the admission pipeline for one request
    pub async fn dispatch(&self, req: Request, next: Next) -> Response {
        let path = req.uri().path().to_string();
        let method = req.method().clone();
        let origin = header_str(req.headers(), "origin");
        let referer = header_str(req.headers(), "referer");
        let client = client_identity(req.headers());

        let Some(policy) = self.policies.lookup(&path).cloned() else {
            // Unknown paths fall through to the router's own 404
            return next.run(req).await;
        };

        // Headers are computed before any check so every outcome carries them
        let mut composed = headers::compose(origin.as_deref(), &self.origins, policy.cache);

        // CORS preflight bypasses everything, including exhausted limiters
        if method == Method::OPTIONS {
            debug!(%path, "Preflight request, short-circuiting");
            let mut response = StatusCode::OK.into_response();
            merge_headers(response.headers_mut(), &composed);
            return response;
        }

        if !policy.allows_method(&method) {
            warn!(%path, method = %method, "Method not whitelisted");
            return rejected(ApiError::MethodNotAllowed, &composed);
        }

        if policy.require_origin_check
            && !self.origins.validate(origin.as_deref(), referer.as_deref())
        {
            warn!(%path, %client, ?origin, "Origin rejected");
            return rejected(ApiError::OriginRejected, &composed);
        }

        let limiter = self.limiter_for(policy.rate_class);
        let key = RateLimitKey::general(&path, &client);
        let result = limiter.check(&key).await;

        // Quota headers are informational and added regardless of outcome
        headers::add_rate_limit_headers(&mut composed, &result);

        if !result.allowed {
            return rejected(
                ApiError::RateLimited {
                    retry_after: result
                        .retry_after
                        .unwrap_or(limiter.config().window_secs),
                },
                &composed,
            );
        }

        if policy.fraud_guard {
            let fraud_result = self.fraud.check(&path, &client).await;
            if !fraud_result.allowed {
                warn!(%path, %client, "Fraud guard tripped");
                return rejected(
                    ApiError::FraudBlocked {
                        retry_after: self.fraud.window_secs(),
                    },
                    &composed,
                );
            }
        }

        let mut response = next.run(req).await;
        merge_headers(response.headers_mut(), &composed);
        response
    }
}

/// Build a terminal rejection carrying the composed header set
fn rejected(error: ApiError, composed: &HeaderMap) -> Response {
    let mut response = error.into_response();
    merge_headers(response.headers_mut(), composed);
    response
}

fn merge_headers(target: &mut HeaderMap, source: &HeaderMap) {
    for (name, value) in source {
        target.insert(name.clone(), value.clone());
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Derive the client identity from forwarded-for headers
///
/// The left-most forwarded-for entry wins, then the real-ip header, then a
/// shared `"unknown"` bucket.
pub fn client_identity(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
