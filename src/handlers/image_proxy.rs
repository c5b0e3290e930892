use crate::error::{ApiError, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
pub struct ImageProxyQuery {
    pub url: Option<String>,
}

/// Proxy a whitelisted asset image
///
/// Only URLs under the configured asset base are forwarded; everything else
/// is rejected so the service cannot be used as an open proxy.
pub async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<ImageProxyQuery>,
) -> Result<Response> {
    let url = query
        .url
        .ok_or_else(|| ApiError::BadRequest("Missing image URL".to_string()))?;

    if !url.starts_with(&state.upstream.asset_base) {
        warn!(%url, "Image proxy URL outside the asset whitelist");
        return Err(ApiError::Forbidden("URL not allowed".to_string()));
    }

    let upstream = state.client.get(&url).send().await.map_err(|e| {
        error!(%url, error = %e, "Error fetching image");
        ApiError::Upstream("Failed to fetch image".to_string())
    })?;

    if !upstream.status().is_success() {
        error!(%url, status = %upstream.status(), "Upstream image fetch failed");
        return Err(ApiError::Upstream("Failed to fetch image".to_string()));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let body = upstream.bytes().await.map_err(|e| {
        error!(%url, error = %e, "Error reading image body");
        ApiError::Upstream("Failed to fetch image".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
