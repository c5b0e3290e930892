use crate::error::Result;
use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::error;

/// The public display counter; no TTL, created implicitly on first increment
pub const CARD_COUNT_KEY: &str = "player_card_count";

/// Read the card counter (0 if no card has been created yet)
pub async fn get_count(State(state): State<AppState>) -> Result<Json<Value>> {
    let count = state.store.get(CARD_COUNT_KEY).await.map_err(|e| {
        error!(error = %e, "Error reading card count");
        e
    })?;

    Ok(Json(json!({ "count": count.unwrap_or(0) })))
}

/// Atomically increment the card counter and return the new value
pub async fn increment(State(state): State<AppState>) -> Result<Json<Value>> {
    let count = state.store.incr(CARD_COUNT_KEY).await.map_err(|e| {
        error!(error = %e, "Error incrementing card count");
        e
    })?;

    Ok(Json(json!({ "count": count })))
}
