//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT, DEFAULT_PUBLIC_URL,
    DEFAULT_SNAPSHOT_INTERVAL_SECS,
};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Deployment environment the service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Deployment {
    /// Wire name as accepted by `ENVIRONMENT`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Hosted deployments listen on public interfaces by default.
    pub fn is_hosted(self) -> bool {
        !matches!(self, Self::Development)
    }
}

impl FromStr for Deployment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which key-value backend holds configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Redb,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" | "disk" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Runtime configuration for the nomoji service.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub storage: StorageBackend,
    pub port: u16,
    pub max_body_size: usize,
    pub deployment: Deployment,
    pub public_url: String,
    pub cleanup_interval_secs: u64,
    pub snapshot_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageBackend::default(),
            port: DEFAULT_PORT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            deployment: Deployment::default(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("nomoji")
        .join("db")
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
///
/// # Arguments
/// - `name`: Environment variable name.
///
/// # Returns
/// `true` when the value is a recognized truthy value.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'", name, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .map(expand_tilde)
                .unwrap_or(defaults.db_path),
            storage: env_parsed("STORAGE").unwrap_or(defaults.storage),
            port: env_parsed("PORT").unwrap_or(defaults.port),
            max_body_size: env_parsed("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            deployment: env_parsed("ENVIRONMENT").unwrap_or(defaults.deployment),
            public_url: env::var("PUBLIC_URL")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.public_url),
            cleanup_interval_secs: env_parsed("CLEANUP_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.cleanup_interval_secs),
            snapshot_interval_secs: env_parsed("SNAPSHOT_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.snapshot_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config, Deployment, StorageBackend};
    use crate::env::{env_lock, EnvGuard};

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn from_env_reads_overrides_and_falls_back_on_garbage() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = EnvGuard::set("ENVIRONMENT", "Staging");
        let _storage = EnvGuard::set("STORAGE", "memory");
        let _port = EnvGuard::set("PORT", "not-a-port");
        let _url = EnvGuard::set("PUBLIC_URL", "https://example.test/");
        let _cleanup = EnvGuard::set("CLEANUP_INTERVAL_SECS", "0");

        let config = Config::from_env();
        assert_eq!(config.deployment, Deployment::Staging);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.port, crate::DEFAULT_PORT);
        assert_eq!(config.public_url, "https://example.test");
        assert_eq!(
            config.cleanup_interval_secs,
            crate::DEFAULT_CLEANUP_INTERVAL_SECS
        );
    }

    #[test]
    fn deployment_defaults_to_production() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = EnvGuard::remove("ENVIRONMENT");
        assert_eq!(Config::from_env().deployment, Deployment::Production);
        assert!("qa".parse::<Deployment>().is_err());
    }
}
