//! Storage layer: a key-value store with expiry and the stores built on it.

/// Configuration documents.
pub mod configs;
/// Storage contract.
pub mod kv;
/// In-process backend.
pub mod memory;
/// Request counters.
pub mod rate_limit;
/// Durable redb backend.
pub mod redb_kv;
/// Metrics snapshots.
pub mod snapshots;

pub use configs::{ConfigStore, WriteKind};
pub use kv::KvStore;
pub use memory::MemoryKv;
pub use rate_limit::{RateLimitDecision, RateLimitStatus, RateLimitStore, RateLimitTier};
pub use redb_kv::{RedbKv, REDB_FILE_NAME};
pub use snapshots::SnapshotStore;

use crate::clock::Clock;
use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use std::sync::Arc;

/// Database handle grouping the typed stores over one key-value backend.
pub struct Database {
    pub kv: Arc<dyn KvStore>,
    pub configs: ConfigStore,
    pub rate_limits: RateLimitStore,
    pub snapshots: SnapshotStore,
}

impl Database {
    /// Open the redb-backed database in directory `path`.
    ///
    /// # Errors
    /// Returns an error when the database cannot be created or opened.
    pub fn open(path: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let kv = RedbKv::open(path, clock.clone())?;
        Ok(Self::from_store(Arc::new(kv), clock))
    }

    /// A database that lives only as long as the process.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::from_store(Arc::new(MemoryKv::new(clock.clone())), clock)
    }

    /// Open whichever backend `config.storage` selects.
    ///
    /// # Errors
    /// Returns an error when the redb backend cannot be opened.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        match config.storage {
            StorageBackend::Redb => Self::open(&config.db_path, clock),
            StorageBackend::Memory => Ok(Self::in_memory(clock)),
        }
    }

    /// Build the typed stores over an arbitrary backend.
    pub fn from_store(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            configs: ConfigStore::new(kv.clone(), clock.clone()),
            rate_limits: RateLimitStore::new(kv.clone(), clock.clone()),
            snapshots: SnapshotStore::new(kv.clone(), clock),
            kv,
        }
    }

    /// Round-trip a probe read against the backend.
    ///
    /// # Errors
    /// Returns the backend error when the store is unreachable.
    pub fn check_health(&self) -> Result<(), AppError> {
        self.kv.get("health:probe").map(|_| ())
    }
}

#[cfg(test)]
mod tests;
