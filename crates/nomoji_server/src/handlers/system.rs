//! Service-level endpoints: health, API index and preset catalog.

use crate::error::{ApiResponse, HttpError};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use nomoji_core::models::config::Configuration;
use nomoji_core::models::presets::{default_config, Preset};
use nomoji_core::models::timestamp;
use nomoji_core::rules::Assistant;
use serde::Serialize;
use std::collections::BTreeMap;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub kv: CheckResult,
    pub analytics: CheckResult,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// Probe the store and report overall status.
///
/// Responds 503 when the store is unreachable. Missing analytics only
/// degrades the service.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let kv = match state.db.check_health() {
        Ok(()) => CheckResult {
            status: "ok",
            message: None,
        },
        Err(err) => {
            tracing::error!("Health check failed: {}", err);
            let message = if state.policy.expose_error_details {
                err.to_string()
            } else {
                "Storage unavailable".to_string()
            };
            CheckResult {
                status: "error",
                message: Some(message),
            }
        }
    };
    let analytics = if state.analytics.is_enabled() {
        CheckResult {
            status: "ok",
            message: None,
        }
    } else {
        CheckResult {
            status: "not_configured",
            message: None,
        }
    };

    let (status, code) = match (kv.status, analytics.status) {
        ("ok", "ok") => ("healthy", StatusCode::OK),
        ("ok", _) => ("degraded", StatusCode::OK),
        _ => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
    };

    let report = HealthReport {
        status,
        timestamp: timestamp::format(&state.clock.now()),
        version: VERSION,
        checks: HealthChecks { kv, analytics },
    };
    (code, Json(report))
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub environment: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub assistants: Vec<&'static str>,
    pub documentation: String,
}

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /health", "Service health"),
    ("GET /api/presets", "Available presets"),
    ("GET /api/config/:userId", "Get a configuration"),
    ("POST /api/config/:userId", "Update a configuration"),
    ("DELETE /api/config/:userId", "Delete a configuration"),
    ("POST /api/config/:userId/preset/:presetName", "Apply a preset"),
    ("GET /api/rules/:userId", "Plain-text rules"),
    ("GET /api/claude/:userId", "Claude subagent"),
    ("GET /api/cursor-rules/:userId", "Cursor project rule"),
    ("GET /api/cursorrules/:userId", "Legacy .cursorrules (deprecated)"),
    ("GET /api/template/:userId/:assistant", "Assistant template"),
    ("GET /api/json/:userId", "Rules and configuration as JSON"),
    ("POST /api/analyze", "Detect emojis in text"),
    ("POST /api/shared", "Share a configuration"),
    ("GET /api/shared/:configId", "Fetch a shared configuration"),
];

pub async fn api_info(State(state): State<AppState>) -> Json<ApiResponse<ApiInfo>> {
    Json(ApiResponse::data(ApiInfo {
        name: "nomoji",
        version: VERSION,
        description: "Emoji usage policies for AI coding assistants",
        environment: state.policy.deployment.as_str(),
        endpoints: ENDPOINTS.iter().copied().collect(),
        assistants: Assistant::ALL.iter().map(|assistant| assistant.name()).collect(),
        documentation: state.config.public_url.clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct PresetCatalog {
    pub available: Vec<&'static str>,
    pub presets: BTreeMap<&'static str, &'static Configuration>,
    pub default: &'static Configuration,
}

pub async fn list_presets() -> Json<ApiResponse<PresetCatalog>> {
    Json(ApiResponse::data(PresetCatalog {
        available: Preset::ALL.iter().map(|preset| preset.name()).collect(),
        presets: Preset::ALL
            .iter()
            .map(|preset| (preset.name(), preset.config()))
            .collect(),
        default: default_config(),
    }))
}

/// Router fallback for unmatched paths.
pub async fn not_found() -> HttpError {
    HttpError::NotFound("Not found".to_string())
}
