//! Shared integration-test server bootstrap helpers.
#![allow(dead_code)]

use axum_test::TestServer;
use nomoji_core::config::{Deployment, StorageBackend};
use nomoji_core::db::{KvStore, MemoryKv};
use nomoji_core::{AppError, Config, Database, ManualClock};
use nomoji_server::{create_app, Analytics, AppState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) fn test_config_for_db_path(db_path: &Path, deployment: Deployment) -> Config {
    Config {
        port: 0,
        db_path: db_path.to_str().expect("db path").to_string(),
        storage: StorageBackend::Redb,
        deployment,
        public_url: "https://nomoji.test".to_string(),
        ..Config::default()
    }
}

pub(crate) fn test_server_for_state(state: AppState) -> TestServer {
    TestServer::new(create_app(state)).expect("server")
}

/// Server over a temporary redb store with a manual clock.
pub(crate) fn setup_server_for(deployment: Deployment) -> (TestServer, TempDir, Arc<ManualClock>) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_db_path(&temp_dir.path().join("db"), deployment);
    let clock = Arc::new(ManualClock::starting_now());
    let db = Database::open(&config.db_path, clock.clone()).expect("open db");
    let state = AppState::new(config, db, clock.clone());
    (test_server_for_state(state), temp_dir, clock)
}

/// Development server: rate limiting off, error details exposed.
pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let (server, temp_dir, _clock) = setup_server_for(Deployment::Development);
    (server, temp_dir)
}

/// Server over an arbitrary key-value backend.
pub(crate) fn setup_server_with_store(
    deployment: Deployment,
    kv: Arc<dyn KvStore>,
    clock: Arc<ManualClock>,
) -> TestServer {
    let config = Config {
        storage: StorageBackend::Memory,
        deployment,
        ..Config::default()
    };
    let db = Database::from_store(kv, clock.clone());
    let state = AppState::with_analytics(config, db, clock, Analytics::tracing());
    test_server_for_state(state)
}

/// Memory store whose operations fail for keys under `prefix`.
pub(crate) struct FailingPrefixKv {
    inner: MemoryKv,
    prefix: &'static str,
}

impl FailingPrefixKv {
    pub(crate) fn new(prefix: &'static str, clock: Arc<ManualClock>) -> Self {
        Self {
            inner: MemoryKv::new(clock),
            prefix,
        }
    }

    fn check(&self, key: &str) -> Result<(), AppError> {
        if key.starts_with(self.prefix) {
            return Err(AppError::Storage("disk on fire".to_string()));
        }
        Ok(())
    }
}

impl KvStore for FailingPrefixKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.check(key)?;
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AppError> {
        self.check(key)?;
        self.inner.put(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.check(key)?;
        self.inner.delete(key)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        self.check(prefix)?;
        self.inner.list_keys(prefix)
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        self.inner.purge_expired()
    }
}
