use super::origin::OriginAllowList;
use super::policy::CachePolicy;
use crate::rate_limit::types::RateLimitResult;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::time::{SystemTime, UNIX_EPOCH};

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Compose the CORS, security and cache headers for a request
///
/// Applied to every response, rejected or admitted. The CORS origin echoes
/// the request's `Origin` verbatim when it is allow-listed; otherwise it
/// falls back to the canonical configured origin rather than a wildcard, so
/// credentialed requests from known origins keep working.
pub fn compose(
    origin: Option<&str>,
    allow_list: &OriginAllowList,
    cache: CachePolicy,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let cors_origin = origin
        .filter(|o| allow_list.contains(o))
        .or_else(|| allow_list.canonical());

    if let Some(value) = cors_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        headers.insert("access-control-allow-origin", value);
    }

    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        "access-control-max-age",
        HeaderValue::from_static("86400"),
    );

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    headers.insert(
        "cache-control",
        HeaderValue::from_static(cache.header_value()),
    );

    headers
}

/// Append informational rate limit headers from a limiter outcome
///
/// Added whether or not the request was ultimately allowed, so clients can
/// introspect quota state even on their last successful call. The reset
/// header carries the unix timestamp at which the window expires.
pub fn add_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if let Ok(value) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert(X_RATELIMIT_LIMIT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert(X_RATELIMIT_REMAINING, value);
    }
    if let Ok(value) = HeaderValue::from_str(&(now + result.reset_after).to_string()) {
        headers.insert(X_RATELIMIT_RESET, value);
    }

    if let Some(retry) = result.retry_after {
        if let Ok(value) = HeaderValue::from_str(&retry.to_string()) {
            headers.insert("retry-after", value);
        }
    }
}
