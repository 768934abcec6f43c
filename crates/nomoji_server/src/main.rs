//! nomoji API server entrypoint.

use nomoji_core::config::env_flag_enabled;
use nomoji_core::{SystemClock, DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT};
use nomoji_server::{
    config::Config, db::Database, resolve_bind_address, scheduled, serve_router, AppState, Clock,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    cleanup: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--cleanup" => flags.cleanup = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|value| value.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nomoji=info,nomoji_server=info,tower_http=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let database = Database::from_config(&config, clock.clone())?;
    tracing::info!(
        environment = config.deployment.as_str(),
        storage = ?config.storage,
        "Opened database at {}",
        config.db_path
    );

    let state = AppState::new(config.clone(), database, clock);

    if cli_flags.cleanup {
        let report = scheduled::run_cleanup(&state);
        println!(
            "Removed {} expired entries and {} stale shared configs",
            report.expired, report.stale_shared
        );
        return Ok(());
    }

    let allow_public = config.deployment.is_hosted() || env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    let bind_addr = resolve_bind_address(&config, allow_public);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("nomoji running at http://{}", actual_addr);

    let maintenance = scheduled::spawn_maintenance(state.clone());
    let serve_result = serve_router(listener, state, shutdown_signal()).await;
    maintenance.shutdown();
    tracing::info!("Server stopped");

    serve_result?;
    Ok(())
}

fn print_help() {
    println!("nomoji API server\n");
    println!("Usage: nomoji-server [OPTIONS]\n");
    println!("Options:");
    println!("  --cleanup         Run one expiry cleanup pass and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Database directory (default: ~/.cache/nomoji/db)");
    println!("  STORAGE           redb or memory (default: redb)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!("  ALLOW_PUBLIC_ACCESS  Permit non-loopback binds in development");
    println!(
        "  MAX_BODY_SIZE     Maximum request body in bytes (default: {})",
        DEFAULT_MAX_BODY_SIZE
    );
    println!("  ENVIRONMENT       development, staging or production (default: production)");
    println!("  PUBLIC_URL        Base URL for share links (default: https://nomoji.dev)");
    println!("  CLEANUP_INTERVAL_SECS   Cleanup cadence (default: 86400)");
    println!("  SNAPSHOT_INTERVAL_SECS  Metrics snapshot cadence (default: 3600)");
    println!("  LOG_FORMAT        text or json (default: text)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
