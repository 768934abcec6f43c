//! Shareable configuration snapshots.

use crate::error::{ApiJson, ApiResponse, HttpError};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use nomoji_core::models::config::{ConfigUpdate, Configuration};
use nomoji_core::validation::validate_config_id;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCreated {
    pub config_id: Uuid,
    pub url: String,
}

/// Store a configuration under a fresh share id for 30 days.
///
/// # Errors
/// Returns 400 for a malformed body and 500 when storage fails.
pub async fn create_shared(
    State(state): State<AppState>,
    ApiJson(update): ApiJson<ConfigUpdate>,
) -> Result<Json<ApiResponse<ShareCreated>>, HttpError> {
    let (config_id, _) = state.db.configs.share(update)?;
    let url = format!("{}/shared/{}", state.config.public_url, config_id);
    tracing::info!(config_id = %config_id, "Configuration shared");
    Ok(Json(
        ApiResponse::data(ShareCreated { config_id, url })
            .with_message("Config shared successfully"),
    ))
}

/// Fetch a shared configuration.
///
/// # Errors
/// Returns 400 for a malformed id and 404 when the share is unknown or expired.
pub async fn get_shared(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
) -> Result<Json<ApiResponse<Configuration>>, HttpError> {
    let config_id = validate_config_id(&config_id)?;
    state
        .db
        .configs
        .get_shared(&config_id)?
        .map(|config| Json(ApiResponse::data(config)))
        .ok_or_else(|| HttpError::NotFound("Config not found".to_string()))
}
