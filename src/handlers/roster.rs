use crate::error::{ApiError, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
}

/// Team abbreviations are exactly three uppercase letters
fn team_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("team id pattern is valid"))
}

pub fn is_valid_team_id(team_id: &str) -> bool {
    team_id_pattern().is_match(team_id)
}

/// Fetch the current roster for a team
pub async fn get_roster(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Value>> {
    let team_id = query
        .team_id
        .filter(|id| is_valid_team_id(id))
        .ok_or_else(|| {
            ApiError::BadRequest("Missing or invalid teamId parameter".to_string())
        })?;

    let url = format!("{}/roster/{}/current", state.upstream.api_base, team_id);

    let response = state.client.get(&url).send().await.map_err(|e| {
        error!(%team_id, error = %e, "Error fetching roster");
        ApiError::Upstream("Failed to fetch team roster".to_string())
    })?;

    if !response.status().is_success() {
        error!(%team_id, status = %response.status(), "Upstream roster fetch failed");
        return Err(ApiError::Upstream("Failed to fetch team roster".to_string()));
    }

    let data: Value = response.json().await.map_err(|e| {
        error!(%team_id, error = %e, "Error decoding roster response");
        ApiError::Upstream("Failed to fetch team roster".to_string())
    })?;

    Ok(Json(data))
}
