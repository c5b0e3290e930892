use crate::error::{ApiError, Result};
use crate::AppState;
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::error;

/// Fetch the current standings and return them sorted alphabetically by
/// team name
pub async fn get_teams(State(state): State<AppState>) -> Result<Json<Value>> {
    let url = format!("{}/standings/now", state.upstream.api_base);

    let response = state.client.get(&url).send().await.map_err(|e| {
        error!(error = %e, "Error fetching teams");
        ApiError::Upstream("Failed to fetch NHL teams".to_string())
    })?;

    if !response.status().is_success() {
        error!(status = %response.status(), "Upstream standings fetch failed");
        return Err(ApiError::Upstream("Failed to fetch NHL teams".to_string()));
    }

    let mut data: Value = response.json().await.map_err(|e| {
        error!(error = %e, "Error decoding standings response");
        ApiError::Upstream("Failed to fetch NHL teams".to_string())
    })?;

    if let Some(standings) = data.get_mut("standings").and_then(|s| s.as_array_mut()) {
        standings.sort_by(|a, b| team_name(a).cmp(team_name(b)));
    }

    Ok(Json(data))
}

fn team_name(team: &Value) -> &str {
    team.pointer("/teamName/default")
        .and_then(|n| n.as_str())
        .unwrap_or("")
}
