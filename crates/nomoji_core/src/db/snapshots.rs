//! Hourly metrics snapshots with a bounded lifetime.

use super::kv::{get_json, put_json, KvStore};
use crate::clock::Clock;
use crate::constants::{METRICS_SNAPSHOT_PREFIX, METRICS_SNAPSHOT_TTL};
use crate::error::AppError;
use crate::models::metrics::{MetricsCounts, MetricsSnapshot};
use crate::models::timestamp;
use std::sync::Arc;

pub struct SnapshotStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl SnapshotStore {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Persist `counts` stamped with the current time.
    ///
    /// # Returns
    /// The stored snapshot.
    ///
    /// # Errors
    /// Returns an error when the store write fails.
    pub fn record(&self, counts: MetricsCounts) -> Result<MetricsSnapshot, AppError> {
        let snapshot = MetricsSnapshot {
            timestamp: self.clock.now(),
            counts,
        };
        let key = format!(
            "{}{}",
            METRICS_SNAPSHOT_PREFIX,
            timestamp::format(&snapshot.timestamp)
        );
        put_json(self.kv.as_ref(), &key, &snapshot, Some(METRICS_SNAPSHOT_TTL))?;
        Ok(snapshot)
    }

    /// Live snapshots, oldest first.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable.
    pub fn list(&self) -> Result<Vec<MetricsSnapshot>, AppError> {
        let mut snapshots = Vec::new();
        for key in self.kv.list_keys(METRICS_SNAPSHOT_PREFIX)? {
            if let Some(snapshot) = get_json(self.kv.as_ref(), &key)? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }
}
