use crate::error::{ErrorBody, ErrorDetail};
use crate::AppState;
use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, response::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Replace the generic 500 message with the underlying error outside production.
pub async fn expose_error_details(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.policy.expose_error_details {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let mut rewritten = envelope(parts, detail.clone());
    rewritten.extensions_mut().insert(ErrorDetail(detail));
    rewritten
}

/// Largest framework error body read back for re-wrapping.
const PLAIN_ERROR_BODY_LIMIT: usize = 4 * 1024;

/// Wrap non-JSON client errors in the error envelope.
///
/// Handlers always answer with the envelope; this covers responses the
/// router builds itself, such as 405 for an unrouted method or a 400 from a
/// path that fails to decode. The plain-text body becomes the message, or
/// the status reason when the body is empty.
pub async fn envelope_plain_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() || is_json(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = match to_bytes(body, PLAIN_ERROR_BODY_LIMIT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(err) => {
            tracing::debug!("Discarding unreadable error body: {}", err);
            String::new()
        }
    };
    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text
    };
    envelope(parts, message)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Rebuild a response as `{success: false, error}` keeping the original
/// status and headers other than the body framing ones.
fn envelope(parts: Parts, message: String) -> Response {
    let mut rewritten = (parts.status, Json(ErrorBody::new(message))).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_LENGTH && name != header::CONTENT_TYPE {
            rewritten.headers_mut().append(name.clone(), value.clone());
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/plain", get(|| async { (StatusCode::BAD_REQUEST, "Invalid URL") }))
            .route("/empty", get(|| async { StatusCode::CONFLICT }))
            .route(
                "/json",
                get(|| async { (StatusCode::NOT_FOUND, Json(ErrorBody::new("Config not found"))) }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(from_fn(envelope_plain_errors))
    }

    async fn call(path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn plain_client_errors_are_enveloped() {
        assert_eq!(
            call("/plain").await,
            (
                StatusCode::BAD_REQUEST,
                r#"{"success":false,"error":"Invalid URL"}"#.to_string()
            )
        );
        assert_eq!(
            call("/empty").await,
            (
                StatusCode::CONFLICT,
                r#"{"success":false,"error":"Conflict"}"#.to_string()
            )
        );
    }

    #[tokio::test]
    async fn json_errors_and_successes_pass_through() {
        assert_eq!(
            call("/json").await,
            (
                StatusCode::NOT_FOUND,
                r#"{"success":false,"error":"Config not found"}"#.to_string()
            )
        );
        assert_eq!(call("/ok").await, (StatusCode::OK, "fine".to_string()));
    }
}
