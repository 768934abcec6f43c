//! Deprecation headers for legacy routes.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

const CURSORRULES_DEPRECATION_WARNING: &str =
    r#"299 - ".cursorrules is deprecated; use /api/cursor-rules/{userId} and .cursor/rules/nomoji.mdc""#;

/// Attach deprecation headers pointing callers at `replacement`.
pub(super) fn with_deprecation_headers<R>(response: R, replacement: &str) -> Response
where
    R: IntoResponse,
{
    let mut response = response.into_response();
    let headers = response.headers_mut();
    headers.insert("deprecation", HeaderValue::from_static("true"));
    headers.insert("x-deprecated", HeaderValue::from_static("true"));
    headers.insert(
        header::WARNING,
        HeaderValue::from_static(CURSORRULES_DEPRECATION_WARNING),
    );
    if let Ok(value) = HeaderValue::from_str(replacement) {
        headers.insert("x-replacement-endpoint", value);
    }
    response
}

/// Emit a structured warning when a deprecated route is used.
pub(super) fn warn_deprecated_route(route: &str, user_id: &str) {
    tracing::warn!(
        target: "nomoji_server::deprecation",
        route,
        user_id,
        "Deprecated route used"
    );
}
