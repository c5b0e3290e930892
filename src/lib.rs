pub mod admission;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod store;

use crate::admission::AdmissionControl;
use crate::config::{AppConfig, UpstreamConfig};
use crate::error::{ApiError, Result};
use crate::store::{CounterStore, LocalCounterStore, RedisCounterStore};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CounterStore>,
    pub client: reqwest::Client,
    pub upstream: UpstreamConfig,
    pub admission: AdmissionControl,
}

impl AppState {
    /// Build the shared state from configuration and an injected store
    pub fn new(config: &AppConfig, store: Arc<dyn CounterStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            store: store.clone(),
            client,
            upstream: config.upstream.clone(),
            admission: AdmissionControl::new(config, store),
        }
    }
}

/// Build the API router with the admission pipeline in front of every route
pub fn build_router(state: AppState) -> Router {
    let admission = state.admission.clone();

    Router::new()
        .route("/api/teams", get(handlers::teams::get_teams))
        .route("/api/roster", get(handlers::roster::get_roster))
        .route("/api/count", get(handlers::count::get_count))
        .route("/api/increment", post(handlers::count::increment))
        .route("/api/image-proxy", get(handlers::image_proxy::get_image))
        .layer(axum::middleware::from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                let admission = admission.clone();
                async move { admission.dispatch(req, next).await }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Select and connect the counter store per configuration
///
/// Redis is the primary when configured; otherwise the service runs on the
/// process-local store, an explicitly logged degraded mode whose limits hold
/// per worker only.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn CounterStore>> {
    match &config.store.redis {
        Some(redis) => {
            let store = RedisCounterStore::connect(&redis.url).await?;
            store.ping().await?;
            info!("Redis connection successful, using shared counter store");
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                "No Redis configured; using process-local counter store \
                 (rate limits apply per worker only)"
            );
            Ok(Arc::new(LocalCounterStore::new(
                config.store.sweep_probability,
            )))
        }
    }
}

/// Initialize and run the API server
pub async fn init_app(config: AppConfig) -> Result<()> {
    config.validate()?;

    info!("Starting stat card API");
    info!(
        "Server listening on {}:{}",
        config.server.host, config.server.port
    );

    let store = build_store(&config).await?;
    let state = AppState::new(&config, store);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(ApiError::Io)?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statcard_api=debug,tower_http=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();
}
