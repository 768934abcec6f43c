//! Key-value storage contract with per-entry expiry.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimal key-value store with optional time-to-live on writes.
///
/// Expired entries must read as absent from `get` and `list_keys` even
/// before `purge_expired` has physically removed them.
pub trait KvStore: Send + Sync {
    /// Fetch the value stored at `key`.
    ///
    /// # Returns
    /// `Ok(None)` when missing or expired.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Arguments
    /// - `key`: Entry key.
    /// - `value`: Raw bytes to store.
    /// - `ttl`: Lifetime after which the entry reads as absent.
    ///
    /// # Errors
    /// Returns an error when the write does not commit.
    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AppError>;

    /// Remove `key`.
    ///
    /// # Returns
    /// `true` when a live entry was removed.
    ///
    /// # Errors
    /// Returns an error when the write does not commit.
    fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Keys of live entries starting with `prefix`, in key order.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Physically remove expired entries.
    ///
    /// # Returns
    /// Number of entries removed.
    ///
    /// # Errors
    /// Returns an error when the write does not commit.
    fn purge_expired(&self) -> Result<usize, AppError>;
}

/// On-disk envelope wrapping every value with its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub expires_at_ms: Option<i64>,
    pub payload: Vec<u8>,
}

impl StoredEntry {
    pub(crate) fn new(payload: &[u8], ttl: Option<Duration>, now_ms: i64) -> Self {
        let expires_at_ms = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now_ms.saturating_add(ttl_ms)
        });
        Self {
            expires_at_ms,
            payload: payload.to_vec(),
        }
    }

    pub(crate) fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms
            .map(|expires_at| expires_at <= now_ms)
            .unwrap_or(false)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, AppError> {
        Ok(bincode::serialize(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, AppError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Read and decode a JSON document.
pub(crate) fn get_json<T: DeserializeOwned>(
    kv: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match kv.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON document.
pub(crate) fn put_json<T: Serialize>(
    kv: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), AppError> {
    let bytes = serde_json::to_vec(value)?;
    kv.put(key, &bytes, ttl)
}
