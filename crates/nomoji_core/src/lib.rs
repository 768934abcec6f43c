//! Core domain library for nomoji (config, storage, rendering, analysis).

/// Clock abstraction used for timestamps and TTL expiry.
pub mod clock;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across crates.
pub mod constants;
/// Key-value storage and the stores built on it.
pub mod db;
/// Emoji detection over plain text.
pub mod emoji;
/// Environment mutation helpers for tests.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Data models for API requests and persistence.
pub mod models;
/// Assistant rule rendering.
pub mod rules;
/// Path parameter validation.
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Deployment, StorageBackend};
pub use constants::*;
pub use db::Database;
pub use error::AppError;
