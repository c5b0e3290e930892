use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Service error types
///
/// Every variant maps to a stable, machine-readable response body. Internal
/// detail (store errors, upstream error text) is logged server-side and never
/// included in a response.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Origin not allowed")]
    OriginRejected,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("Too many card creations, please try again later")]
    FraudBlocked { retry_after: u64 },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Counter store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::OriginRejected => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::FraudBlocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `retryAfter` value carried by rate-limit rejections, in seconds
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after } | ApiError::FraudBlocked { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }

    /// The `error` string exposed to clients
    ///
    /// Server-side failures collapse to a generic message so store or IO
    /// error text never leaks into a response body.
    fn client_message(&self) -> String {
        match self {
            ApiError::Config(_)
            | ApiError::Store(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::BadRequest(msg) | ApiError::Upstream(msg) | ApiError::Forbidden(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self.retry_after() {
            Some(retry_after) => Json(json!({
                "error": self.client_message(),
                "retryAfter": retry_after,
            })),
            None => Json(json!({
                "error": self.client_message(),
            })),
        };

        (status, body).into_response()
    }
}
