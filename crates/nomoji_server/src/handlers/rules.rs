//! Rendered rule documents for AI assistants.

use super::deprecation::{warn_deprecated_route, with_deprecation_headers};
use crate::error::HttpError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use nomoji_core::rules::{self, Assistant, OutputFormat};
use nomoji_core::validation::validate_user_id;

fn render_for_user(state: &AppState, user_id: &str, format: OutputFormat) -> Result<Response, HttpError> {
    let user_id = validate_user_id(user_id)?;
    let config = state.db.configs.get_or_create(user_id)?;
    let body = rules::render(&config, format, state.clock.now())?;

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    if let Some(disposition) = format.content_disposition() {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static(disposition),
        );
    }
    Ok(response)
}

/// Plain-text rules.
pub async fn get_rules(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, HttpError> {
    render_for_user(&state, &user_id, OutputFormat::Plain)
}

/// Claude subagent definition, served as `nomoji.mdc`.
pub async fn get_claude(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, HttpError> {
    render_for_user(&state, &user_id, OutputFormat::ClaudeSubagent)
}

/// Cursor project rule, served as `nomoji.mdc`.
pub async fn get_cursor_rules(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, HttpError> {
    render_for_user(&state, &user_id, OutputFormat::CursorMdc)
}

/// Deprecated `.cursorrules` notice.
pub async fn get_legacy_cursorrules(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, HttpError> {
    let response = render_for_user(&state, &user_id, OutputFormat::LegacyCursorRules)?;
    warn_deprecated_route("/api/cursorrules", &user_id);
    Ok(with_deprecation_headers(
        response,
        &format!("/api/cursor-rules/{}", user_id),
    ))
}

/// Template for the named assistant.
///
/// # Errors
/// Returns 400 for an unknown assistant name.
pub async fn get_template(
    State(state): State<AppState>,
    Path((user_id, assistant)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let assistant: Assistant = assistant.parse()?;
    render_for_user(&state, &user_id, assistant.format())
}

/// `{"nomoji": {...}}` document with the rules and the configuration.
pub async fn get_json(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, HttpError> {
    render_for_user(&state, &user_id, OutputFormat::Json)
}
