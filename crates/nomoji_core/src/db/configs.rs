//! Per-user and shared configuration storage.

use super::kv::{get_json, put_json, KvStore};
use crate::clock::Clock;
use crate::constants::{SHARED_CONFIG_PREFIX, SHARED_CONFIG_TTL, USER_CONFIG_PREFIX};
use crate::error::AppError;
use crate::models::config::{ConfigUpdate, Configuration, Metadata};
use crate::models::presets::{default_config, Preset};
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

/// Whether a write created the record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
}

impl WriteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Updated => "update",
        }
    }
}

fn user_key(user_id: &str) -> String {
    format!("{}{}", USER_CONFIG_PREFIX, user_id)
}

fn shared_key(id: &Uuid) -> String {
    format!("{}{}", SHARED_CONFIG_PREFIX, id)
}

/// Accessor for configuration documents in the key-value store.
///
/// Updates are read-modify-write without compare-and-swap: two concurrent
/// updates to the same user are last-writer-wins and the earlier write's
/// fields can be lost.
pub struct ConfigStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl ConfigStore {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Fetch a user's stored configuration, if any.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable or the document is corrupt.
    pub fn get(&self, user_id: &str) -> Result<Option<Configuration>, AppError> {
        get_json(self.kv.as_ref(), &user_key(user_id))
    }

    /// Fetch a user's configuration, materializing the default template when
    /// none is stored.
    ///
    /// The materialized default is stamped with fresh metadata but not
    /// persisted; the first write creates the record.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable or the document is corrupt.
    pub fn get_or_create(&self, user_id: &str) -> Result<Configuration, AppError> {
        if let Some(config) = self.get(user_id)? {
            return Ok(config);
        }
        let now = self.clock.now();
        let mut config = default_config().clone();
        config.metadata = Some(Metadata {
            created_at: now,
            updated_at: now,
            user_id: Some(user_id.to_string()),
        });
        Ok(config)
    }

    /// Shallow-merge `update` over the stored (or default) configuration and persist it.
    ///
    /// # Arguments
    /// - `user_id`: Owner of the record.
    /// - `update`: Partial document; see [`Configuration::merged`].
    ///
    /// # Returns
    /// The persisted document and whether it was newly created.
    ///
    /// # Errors
    /// Returns an error when reading or writing the store fails.
    pub fn update(
        &self,
        user_id: &str,
        update: ConfigUpdate,
    ) -> Result<(Configuration, WriteKind), AppError> {
        let key = user_key(user_id);
        let existing: Option<Configuration> = get_json(self.kv.as_ref(), &key)?;
        let previous = existing.as_ref().and_then(|config| config.metadata.clone());

        let mut merged = Configuration::merged(existing.as_ref().unwrap_or(default_config()), update);

        let now = self.clock.now();
        let created_at = previous.as_ref().map(|meta| meta.created_at).unwrap_or(now);
        let updated_at = match previous.as_ref() {
            Some(meta) if now <= meta.updated_at => meta.updated_at + Duration::milliseconds(1),
            _ => now,
        };
        merged.metadata = Some(Metadata {
            created_at,
            updated_at,
            user_id: Some(user_id.to_string()),
        });

        put_json(self.kv.as_ref(), &key, &merged, None)?;

        let kind = if existing.is_some() {
            WriteKind::Updated
        } else {
            WriteKind::Created
        };
        tracing::debug!(user_id, kind = kind.as_str(), "Configuration saved");
        Ok((merged, kind))
    }

    /// Apply a named preset as a partial update.
    ///
    /// # Errors
    /// Returns an error when reading or writing the store fails.
    pub fn apply_preset(
        &self,
        user_id: &str,
        preset: Preset,
    ) -> Result<(Configuration, WriteKind), AppError> {
        self.update(user_id, preset.to_update())
    }

    /// Remove a user's configuration.
    ///
    /// # Returns
    /// `true` when a record existed.
    ///
    /// # Errors
    /// Returns an error when the store write fails.
    pub fn delete(&self, user_id: &str) -> Result<bool, AppError> {
        self.kv.delete(&user_key(user_id))
    }

    /// User IDs that have a stored configuration.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable.
    pub fn list_users(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .kv
            .list_keys(USER_CONFIG_PREFIX)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(USER_CONFIG_PREFIX).map(str::to_string))
            .collect())
    }

    /// Normalize a client payload over the default template and store it as
    /// a new shared configuration.
    ///
    /// # Returns
    /// The new share ID and the stored document.
    ///
    /// # Errors
    /// Returns an error when the store write fails.
    pub fn share(&self, update: ConfigUpdate) -> Result<(Uuid, Configuration), AppError> {
        let now = self.clock.now();
        let mut config = Configuration::merged(default_config(), update);
        config.metadata = Some(Metadata {
            created_at: now,
            updated_at: now,
            user_id: None,
        });
        let id = Uuid::new_v4();
        self.save_shared(&id, &config)?;
        Ok((id, config))
    }

    /// Store `config` under share `id` with the shared-config lifetime.
    ///
    /// # Errors
    /// Returns an error when the store write fails.
    pub fn save_shared(&self, id: &Uuid, config: &Configuration) -> Result<(), AppError> {
        put_json(
            self.kv.as_ref(),
            &shared_key(id),
            config,
            Some(SHARED_CONFIG_TTL),
        )
    }

    /// Fetch a shared configuration.
    ///
    /// # Returns
    /// `Ok(None)` when the ID is unknown or the share has expired.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable or the document is corrupt.
    pub fn get_shared(&self, id: &Uuid) -> Result<Option<Configuration>, AppError> {
        get_json(self.kv.as_ref(), &shared_key(id))
    }

    /// Delete shared configurations created more than `max_age` ago.
    ///
    /// Records that fail to decode or carry no creation time are skipped.
    ///
    /// # Returns
    /// Number of records deleted.
    ///
    /// # Errors
    /// Returns an error when listing or deleting fails.
    pub fn sweep_stale_shared(&self, max_age: Duration) -> Result<usize, AppError> {
        let cutoff = self.clock.now() - max_age;
        let mut deleted = 0;
        for key in self.kv.list_keys(SHARED_CONFIG_PREFIX)? {
            let config = match get_json::<Configuration>(self.kv.as_ref(), &key) {
                Ok(Some(config)) => config,
                Ok(None) => continue,
                Err(AppError::Json(err)) => {
                    tracing::warn!(key = key.as_str(), "Skipping unreadable shared config: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let Some(created_at) = config.metadata.map(|meta| meta.created_at) else {
                continue;
            };
            if created_at < cutoff && self.kv.delete(&key)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
