use crate::analytics::AnalyticsEvent;
use crate::error::ErrorDetail;
use crate::policy::{SERVER_TIMING, X_REQUEST_ID, X_RESPONSE_TIME};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use hyper::HeaderMap;
use rand::{distributions::Alphanumeric, Rng};
use std::time::Instant;
use tracing::Instrument;

const MAX_CLIENT_REQUEST_ID_LEN: usize = 128;

/// Request id stored in request extensions for handlers that want it.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// `req_<epoch ms>_<9 random chars>`.
pub(crate) fn generate_request_id(now_ms: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("req_{}_{}", now_ms, suffix)
}

fn client_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_REQUEST_ID)?.to_str().ok()?.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_CLIENT_REQUEST_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    acceptable.then(|| value.to_string())
}

/// Tag the request with an id, log it, time it and record analytics.
///
/// A client-supplied `X-Request-Id` is reused when it is a short token;
/// otherwise a fresh id is generated.
pub async fn track_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = client_request_id(request.headers())
        .unwrap_or_else(|| generate_request_id(state.clock.now().timestamp_millis()));
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let span = tracing::info_span!(
        "http.request",
        request_id = request_id.as_str(),
        method = method.as_str(),
        path = path.as_str(),
    );

    async move {
        tracing::info!(
            user_agent = user_agent.as_deref().unwrap_or("unknown"),
            "Request received"
        );

        let mut response = next.run(request).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), duration_ms, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), duration_ms, "Request completed");
        }

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(X_REQUEST_ID, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}ms", duration_ms)) {
            headers.insert(X_RESPONSE_TIME, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("total;dur={}", duration_ms)) {
            headers.insert(SERVER_TIMING, value);
        }

        if status.is_client_error() || status.is_server_error() {
            let message = response
                .extensions()
                .get::<ErrorDetail>()
                .map(|detail| detail.0.clone())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            state.analytics.track(AnalyticsEvent::Error {
                path: path.clone(),
                status: status.as_u16(),
                message,
            });
        }
        state.analytics.track(AnalyticsEvent::Request {
            method,
            path,
            status: status.as_u16(),
            duration_ms,
            user_agent,
        });

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate_request_id(1_700_000_000_000);
        let suffix = id
            .strip_prefix("req_1700000000000_")
            .expect("timestamp prefix");
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn client_ids_are_reused_only_when_well_formed() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_request_id(&headers), None);

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("trace-42.a_b"));
        assert_eq!(client_request_id(&headers).as_deref(), Some("trace-42.a_b"));

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("has spaces"));
        assert_eq!(client_request_id(&headers), None);

        let too_long = "x".repeat(MAX_CLIENT_REQUEST_ID_LEN + 1);
        headers.insert(X_REQUEST_ID, HeaderValue::from_str(&too_long).expect("ascii"));
        assert_eq!(client_request_id(&headers), None);
    }
}
