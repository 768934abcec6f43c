use crate::error::HttpError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject bodies whose declared `Content-Length` exceeds the configured limit.
///
/// Bodies without a length header are still capped by
/// [`axum::extract::DefaultBodyLimit`] when an extractor reads them.
pub async fn limit_body_size(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.max_body_size;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    if let Some(length) = declared {
        if length > limit as u64 {
            tracing::warn!(length, limit, "Rejecting oversized request body");
            return HttpError::PayloadTooLarge(format!(
                "Request body too large. Maximum size is {} bytes.",
                limit
            ))
            .into_response();
        }
    }
    next.run(request).await
}
