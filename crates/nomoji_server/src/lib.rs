//! HTTP server wiring for nomoji (routes, middleware, and shared state).

/// Usage analytics sinks and counters.
pub mod analytics;
/// HTTP error mapping and response envelopes.
pub mod error;
/// HTTP handlers.
pub mod handlers;
/// Request middleware.
pub mod middleware;
/// Per-deployment HTTP policy.
pub mod policy;
/// Background maintenance tasks.
pub mod scheduled;

pub use analytics::{Analytics, AnalyticsEvent, AnalyticsSink};
pub use nomoji_core::{config, db, models, AppError, Clock, Config, Database, DEFAULT_PORT};
pub use policy::DeploymentPolicy;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use handlers::{analyze, config as config_handlers, rules, shared, system};
use middleware::{error_detail, observability, rate_limit, size_limit};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub policy: Arc<DeploymentPolicy>,
    pub analytics: Arc<Analytics>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Construct shared application state with tracing analytics.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    /// - `clock`: Time source shared with the stores.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, db: Database, clock: Arc<dyn Clock>) -> Self {
        Self::with_analytics(config, db, clock, Analytics::tracing())
    }

    /// Construct shared application state with a caller-supplied analytics fan-out.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    /// - `clock`: Time source shared with the stores.
    /// - `analytics`: Analytics sinks and counters.
    ///
    /// # Returns
    /// A new [`AppState`] with the deployment policy resolved from `config`.
    pub fn with_analytics(
        config: Config,
        db: Database,
        clock: Arc<dyn Clock>,
        analytics: Analytics,
    ) -> Self {
        Self {
            db: Arc::new(db),
            policy: Arc::new(DeploymentPolicy::for_deployment(config.deployment)),
            config: Arc::new(config),
            analytics: Arc::new(analytics),
            clock,
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// Middleware, outermost first: security headers, CORS, request tracing,
/// observability, error-detail exposure, plain-error enveloping, body size
/// limit. Rate limiting is attached to the `/api` routes only. Unmatched
/// paths answer 404 with the error envelope.
///
/// # Arguments
/// - `state`: Shared application state.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api", get(system::api_info))
        .route("/api/presets", get(system::list_presets))
        .route(
            "/api/config/:user_id",
            get(config_handlers::get_config)
                .post(config_handlers::update_config)
                .delete(config_handlers::delete_config),
        )
        .route(
            "/api/config/:user_id/preset/:preset_name",
            post(config_handlers::apply_preset),
        )
        .route("/api/rules/:user_id", get(rules::get_rules))
        .route("/api/claude/:user_id", get(rules::get_claude))
        .route("/api/cursor-rules/:user_id", get(rules::get_cursor_rules))
        .route("/api/cursorrules/:user_id", get(rules::get_legacy_cursorrules))
        .route("/api/template/:user_id/:assistant", get(rules::get_template))
        .route("/api/json/:user_id", get(rules::get_json))
        .route("/api/analyze", post(analyze::analyze_text))
        .route("/api/shared", post(shared::create_shared))
        .route("/api/shared/:config_id", get(shared::get_shared))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::enforce));

    let hsts = state
        .policy
        .hsts
        .then(|| HeaderValue::from_static(HSTS_VALUE));

    Router::new()
        .route("/health", get(system::health))
        .merge(api)
        .fallback(system::not_found)
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_XSS_PROTECTION,
                    HeaderValue::from_static("1; mode=block"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    PERMISSIONS_POLICY,
                    HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
                ))
                // `None` outside production leaves the header unset.
                .layer(SetResponseHeaderLayer::overriding(
                    header::STRICT_TRANSPORT_SECURITY,
                    hsts,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(state.policy.cors_layer())
                .layer(from_fn_with_state(
                    state.clone(),
                    observability::track_request,
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    error_detail::expose_error_details,
                ))
                .layer(from_fn(error_detail::envelope_plain_errors))
                .layer(from_fn_with_state(state.clone(), size_limit::limit_body_size))
                .layer(DefaultBodyLimit::max(state.config.max_body_size)),
        )
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

/// Run the Axum server with graceful shutdown support.
///
/// Connections carry their peer address so rate limiting can fall back to it.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
}

#[cfg(test)]
mod tests {
    use super::resolve_bind_address;
    use nomoji_core::env::{env_lock, EnvGuard};
    use nomoji_core::Config;
    use std::net::SocketAddr;

    fn config_on_port(port: u16) -> Config {
        Config {
            port,
            ..Config::default()
        }
    }

    #[test]
    fn resolve_bind_address_enforces_loopback_when_public_access_disabled() {
        let _lock = env_lock().lock().expect("env lock");
        let _bind = EnvGuard::set("BIND", "0.0.0.0:4040");

        let resolved = resolve_bind_address(&config_on_port(4040), false);
        assert_eq!(resolved.ip().to_string(), "127.0.0.1");
        assert_eq!(resolved.port(), 4040);

        let public = resolve_bind_address(&config_on_port(4040), true);
        assert_eq!(public, SocketAddr::from(([0, 0, 0, 0], 4040)));
    }

    #[test]
    fn resolve_bind_address_allows_loopback_and_invalid_fallback() {
        let _lock = env_lock().lock().expect("env lock");
        let config = config_on_port(4041);
        {
            let _bind = EnvGuard::remove("BIND");
            let loopback = resolve_bind_address(&config, false);
            assert_eq!(loopback, SocketAddr::from(([127, 0, 0, 1], 4041)));
        }

        let _bind = EnvGuard::set("BIND", "bad:host");
        let fallback = resolve_bind_address(&config, false);
        assert_eq!(fallback, SocketAddr::from(([127, 0, 0, 1], 4041)));
    }
}
