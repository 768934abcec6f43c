//! In-process [`KvStore`] for tests and ephemeral deployments.

use super::kv::{KvStore, StoredEntry};
use crate::clock::Clock;
use crate::error::AppError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, StoredEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKv {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredEntry>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let now_ms = self.now_ms();
        Ok(self
            .entries()?
            .get(key)
            .filter(|entry| !entry.is_expired(now_ms))
            .map(|entry| entry.payload.clone()))
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AppError> {
        let entry = StoredEntry::new(value, ttl, self.now_ms());
        self.entries()?.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        let now_ms = self.now_ms();
        Ok(self
            .entries()?
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(now_ms)))
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let now_ms = self.now_ms();
        Ok(self
            .entries()?
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| !entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        let now_ms = self.now_ms();
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        Ok(before - entries.len())
    }
}
