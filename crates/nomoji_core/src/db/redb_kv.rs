//! Durable [`KvStore`] backed by a single redb table.

use super::kv::{KvStore, StoredEntry};
use crate::clock::Clock;
use crate::error::AppError;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// All entries, `StoredEntry` bincode-encoded.
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// redb-backed store.
pub struct RedbKv {
    db: Arc<redb::Database>,
    clock: Arc<dyn Clock>,
}

impl RedbKv {
    /// Open (or create) the store inside directory `path`.
    ///
    /// # Returns
    /// A store with its table initialized.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or redb fails
    /// to open the file.
    pub fn open(path: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let dir = Path::new(path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::Storage(format!(
                "Failed to create database directory '{}': {}",
                dir.display(),
                err
            ))
        })?;
        let db = redb::Database::create(dir.join(REDB_FILE_NAME))?;
        Self::new(Arc::new(db), clock)
    }

    /// Wrap an already open database, creating the table if needed.
    ///
    /// # Errors
    /// Returns an error when table initialization fails.
    pub fn new(db: Arc<redb::Database>, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(ENTRIES)?;
        write_txn.commit()?;
        Ok(Self { db, clock })
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

impl KvStore for RedbKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        let Some(raw) = table.get(key)? else {
            return Ok(None);
        };
        let entry = StoredEntry::decode(raw.value())?;
        if entry.is_expired(self.now_ms()) {
            return Ok(None);
        }
        Ok(Some(entry.payload))
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AppError> {
        let encoded = StoredEntry::new(value, ttl, self.now_ms()).encode()?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.insert(key, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        let now_ms = self.now_ms();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let removed = table.remove(key)?;
            match removed {
                Some(raw) => !StoredEntry::decode(raw.value())?.is_expired(now_ms),
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let now_ms = self.now_ms();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        let mut keys = Vec::new();
        for row in table.range(prefix..)? {
            let (key, value) = row?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            if !StoredEntry::decode(value.value())?.is_expired(now_ms) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        let now_ms = self.now_ms();
        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let mut expired = Vec::new();
            for row in table.iter()? {
                let (key, value) = row?;
                match StoredEntry::decode(value.value()) {
                    Ok(entry) if entry.is_expired(now_ms) => expired.push(key.value().to_string()),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(key = key.value(), "Skipping undecodable entry: {}", err);
                    }
                }
            }
            for key in &expired {
                table.remove(key.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(purged)
    }
}
