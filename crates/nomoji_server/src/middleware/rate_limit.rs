use crate::error::ErrorBody;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hyper::HeaderMap;
use nomoji_core::db::{RateLimitDecision, RateLimitStatus, RateLimitTier};
use nomoji_core::models::timestamp;
use nomoji_core::validation::validate_user_id;
use std::net::SocketAddr;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Route prefixes whose next path segment is a user id.
const USER_SCOPED_RESOURCES: &[&str] = &[
    "config",
    "rules",
    "claude",
    "cursor-rules",
    "cursorrules",
    "template",
    "json",
];

fn user_from_path(path: &str) -> Option<&str> {
    let mut segments = path.strip_prefix("/api/")?.split('/');
    let resource = segments.next()?;
    if !USER_SCOPED_RESOURCES.contains(&resource) {
        return None;
    }
    segments.next().and_then(|user| validate_user_id(user).ok())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Key a request is counted under.
///
/// # Arguments
/// - `path`: Request path.
/// - `headers`: Request headers, consulted for proxy-provided client IPs.
/// - `peer`: Socket address of the connection, when known.
///
/// # Returns
/// `user:<id>` for user-scoped routes, `ip:<addr>` when a client address is
/// known, `anonymous` otherwise.
pub fn rate_limit_identity(path: &str, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(user) = user_from_path(path) {
        return format!("user:{}", user);
    }
    let forwarded = header_str(headers, CF_CONNECTING_IP).or_else(|| {
        header_str(headers, X_FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    });
    match (forwarded, peer) {
        (Some(ip), _) => format!("ip:{}", ip),
        (None, Some(addr)) => format!("ip:{}", addr.ip()),
        (None, None) => "anonymous".to_string(),
    }
}

fn tiers_for(method: &Method) -> &'static [RateLimitTier] {
    if matches!(*method, Method::POST | Method::PUT | Method::DELETE) {
        &[RateLimitTier::Moderate, RateLimitTier::Writes]
    } else {
        &[RateLimitTier::Moderate]
    }
}

fn apply_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    if let Ok(reset) = HeaderValue::from_str(&timestamp::format(&status.reset_at)) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
}

fn too_many_requests(status: &RateLimitStatus) -> Response {
    let body = ErrorBody {
        retry_after: Some(status.retry_after_secs),
        ..ErrorBody::new(RATE_LIMITED_MESSAGE)
    };
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(status.retry_after_secs));
    apply_headers(headers, status);
    response
}

/// Charge the request against its tiers and reject it once a budget is spent.
///
/// A counter store failure lets the request through uncounted.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.policy.rate_limiting {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let identity = rate_limit_identity(request.uri().path(), request.headers(), peer);

    let mut tightest: Option<RateLimitStatus> = None;
    for &tier in tiers_for(request.method()) {
        match state.db.rate_limits.check(tier, &identity) {
            Ok(RateLimitDecision::Allowed(status)) => {
                if tightest.map_or(true, |current| status.remaining < current.remaining) {
                    tightest = Some(status);
                }
            }
            Ok(RateLimitDecision::Limited(status)) => {
                tracing::warn!(
                    identity = identity.as_str(),
                    tier = tier.name(),
                    retry_after = status.retry_after_secs,
                    "Rate limit exceeded"
                );
                return too_many_requests(&status);
            }
            Err(err) => {
                tracing::warn!(
                    identity = identity.as_str(),
                    tier = tier.name(),
                    "Rate limit store unavailable, allowing request: {}",
                    err
                );
            }
        }
    }

    let mut response = next.run(request).await;
    if let Some(status) = tightest {
        apply_headers(response.headers_mut(), &status);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_scoped_routes_key_on_user() {
        let headers = HeaderMap::new();
        assert_eq!(
            rate_limit_identity("/api/config/alice", &headers, None),
            "user:alice"
        );
        assert_eq!(
            rate_limit_identity("/api/template/bob.smith/claude", &headers, None),
            "user:bob.smith"
        );
    }

    #[test]
    fn invalid_user_segments_fall_back_to_ip() {
        let peer = Some(SocketAddr::from(([192, 0, 2, 10], 5555)));
        let headers = HeaderMap::new();
        assert_eq!(
            rate_limit_identity("/api/config/a", &headers, peer),
            "ip:192.0.2.10"
        );
        assert_eq!(
            rate_limit_identity("/api/analyze", &headers, peer),
            "ip:192.0.2.10"
        );
    }

    #[test]
    fn proxy_headers_take_precedence_over_socket() {
        let peer = Some(SocketAddr::from(([10, 0, 0, 1], 443)));
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(
            rate_limit_identity("/api/shared", &headers, peer),
            "ip:203.0.113.9"
        );

        headers.insert(CF_CONNECTING_IP, HeaderValue::from_static("198.51.100.4"));
        assert_eq!(
            rate_limit_identity("/api/shared", &headers, peer),
            "ip:198.51.100.4"
        );
    }

    #[test]
    fn unknown_clients_are_anonymous() {
        assert_eq!(
            rate_limit_identity("/api/presets", &HeaderMap::new(), None),
            "anonymous"
        );
    }

    #[test]
    fn writes_pay_both_tiers() {
        assert_eq!(tiers_for(&Method::GET), &[RateLimitTier::Moderate]);
        assert_eq!(
            tiers_for(&Method::DELETE),
            &[RateLimitTier::Moderate, RateLimitTier::Writes]
        );
    }
}
