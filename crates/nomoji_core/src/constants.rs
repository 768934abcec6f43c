//! Shared constants used across nomoji crates.

use std::time::Duration;

/// Default API port.
pub const DEFAULT_PORT: u16 = 8787;

/// Default maximum request body accepted by the API layer.
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// Schema version stamped on every configuration document.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Public site used for share URLs and rendered footers.
pub const DEFAULT_PUBLIC_URL: &str = "https://nomoji.dev";

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:8787";

/// Lifetime of a shared configuration.
pub const SHARED_CONFIG_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Age after which the cleanup sweep deletes a shared configuration.
pub const SHARED_CONFIG_MAX_AGE_DAYS: i64 = 30;

/// Lifetime of an hourly metrics snapshot.
pub const METRICS_SNAPSHOT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default cadence of the cleanup sweep.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Default cadence of the metrics snapshot.
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 60 * 60;

/// Key prefix for per-user configuration documents.
pub const USER_CONFIG_PREFIX: &str = "prefs:";
/// Key prefix for shared configuration documents.
pub const SHARED_CONFIG_PREFIX: &str = "config:";
/// Key prefix for rate-limit counters.
pub const RATE_LIMIT_PREFIX: &str = "rl:";
/// Key prefix for hourly metrics snapshots.
pub const METRICS_SNAPSHOT_PREFIX: &str = "analytics:hourly:";
