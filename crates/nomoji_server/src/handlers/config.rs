//! Per-user configuration handlers.

use crate::analytics::AnalyticsEvent;
use crate::error::{ApiJson, ApiResponse, HttpError};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use nomoji_core::db::WriteKind;
use nomoji_core::models::config::{ConfigUpdate, Configuration};
use nomoji_core::models::presets::Preset;
use nomoji_core::validation::validate_user_id;

fn track_change(state: &AppState, user_id: &str, action: &'static str, preset: Option<Preset>) {
    state.analytics.track(AnalyticsEvent::ConfigChange {
        user_id: user_id.to_string(),
        action,
        preset,
    });
}

/// Fetch a user's configuration, or the default template when none is stored.
///
/// # Returns
/// The configuration wrapped in the response envelope.
///
/// # Errors
/// Returns 400 for a malformed user id and 500 when storage fails.
pub async fn get_config(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Configuration>>, HttpError> {
    let user_id = validate_user_id(&user_id)?;
    let config = state.db.configs.get_or_create(user_id)?;
    Ok(Json(ApiResponse::data(config)))
}

/// Shallow-merge a partial configuration into the user's stored one.
///
/// # Errors
/// Returns 400 for a malformed user id or body and 500 when storage fails.
pub async fn update_config(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<ConfigUpdate>,
) -> Result<Json<ApiResponse<Configuration>>, HttpError> {
    let user_id = validate_user_id(&user_id)?;
    let (config, kind) = state.db.configs.update(user_id, update)?;
    track_change(&state, user_id, kind.as_str(), None);
    Ok(Json(
        ApiResponse::data(config).with_message("Configuration updated successfully"),
    ))
}

/// Apply a named preset.
///
/// # Errors
/// Returns 400 for a malformed user id or unknown preset name.
pub async fn apply_preset(
    State(state): State<AppState>,
    Path((user_id, preset_name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Configuration>>, HttpError> {
    let user_id = validate_user_id(&user_id)?;
    let preset: Preset = preset_name.parse()?;
    let (config, kind): (Configuration, WriteKind) = state.db.configs.apply_preset(user_id, preset)?;
    track_change(&state, user_id, kind.as_str(), Some(preset));
    Ok(Json(ApiResponse::data(config).with_message(format!(
        "Preset '{}' applied successfully",
        preset
    ))))
}

/// Delete a user's configuration; later reads fall back to the default.
///
/// Deleting a user with no stored configuration still succeeds.
pub async fn delete_config(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, HttpError> {
    let user_id = validate_user_id(&user_id)?;
    let existed = state.db.configs.delete(user_id)?;
    if existed {
        track_change(&state, user_id, "delete", None);
    }
    Ok(Json(ApiResponse::message("Configuration deleted successfully")))
}
