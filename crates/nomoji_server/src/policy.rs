//! Per-deployment HTTP policy: CORS origins, rate limiting, error detail, HSTS.

use axum::http::{header, HeaderName, HeaderValue, Method};
use nomoji_core::Deployment;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub(crate) const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub(crate) const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");
pub(crate) const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

const DEVELOPMENT_ORIGINS: &[&str] = &["http://localhost:8787", "http://127.0.0.1:8787"];
const STAGING_ORIGINS: &[&str] = &[
    "https://staging.nomoji.dev",
    "https://nomoji.dev",
    "https://api.nomoji.dev",
];
const PRODUCTION_ORIGINS: &[&str] = &[
    "https://nomoji.dev",
    "https://api.nomoji.dev",
    "https://www.nomoji.dev",
];

const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Behavior switches resolved once from the deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPolicy {
    pub deployment: Deployment,
    pub allowed_origins: Vec<&'static str>,
    /// Echo any request origin back (development only).
    pub mirror_any_origin: bool,
    pub rate_limiting: bool,
    pub expose_error_details: bool,
    pub hsts: bool,
}

impl DeploymentPolicy {
    pub fn for_deployment(deployment: Deployment) -> Self {
        match deployment {
            Deployment::Development => Self {
                deployment,
                allowed_origins: DEVELOPMENT_ORIGINS.to_vec(),
                mirror_any_origin: true,
                rate_limiting: false,
                expose_error_details: true,
                hsts: false,
            },
            Deployment::Staging => Self {
                deployment,
                allowed_origins: STAGING_ORIGINS.to_vec(),
                mirror_any_origin: false,
                rate_limiting: true,
                expose_error_details: true,
                hsts: false,
            },
            Deployment::Production => Self {
                deployment,
                allowed_origins: PRODUCTION_ORIGINS.to_vec(),
                mirror_any_origin: false,
                rate_limiting: true,
                expose_error_details: false,
                hsts: true,
            },
        }
    }

    /// CORS layer for this deployment.
    ///
    /// Credentials are allowed, so origins are always listed or mirrored,
    /// never `*`.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins = if self.mirror_any_origin {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(
                self.allowed_origins
                    .iter()
                    .copied()
                    .map(HeaderValue::from_static),
            )
        };

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_REQUEST_ID])
            .expose_headers([X_REQUEST_ID, X_RESPONSE_TIME, SERVER_TIMING])
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE)
    }
}
