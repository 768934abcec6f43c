//! Background maintenance: expiry cleanup and hourly metrics snapshots.

use crate::AppState;
use nomoji_core::models::metrics::MetricsSnapshot;
use nomoji_core::SHARED_CONFIG_MAX_AGE_DAYS;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Entries dropped because their TTL elapsed.
    pub expired: usize,
    /// Shared configurations older than the share lifetime.
    pub stale_shared: usize,
}

/// Purge expired entries, then sweep old shared configurations.
///
/// Failures are logged and reported as zero removals.
pub fn run_cleanup(state: &AppState) -> CleanupReport {
    let expired = state.db.kv.purge_expired().unwrap_or_else(|err| {
        tracing::error!("Scheduled cleanup failed to purge expired entries: {}", err);
        0
    });
    let stale_shared = state
        .db
        .configs
        .sweep_stale_shared(chrono::Duration::days(SHARED_CONFIG_MAX_AGE_DAYS))
        .unwrap_or_else(|err| {
            tracing::error!("Scheduled cleanup failed to sweep shared configs: {}", err);
            0
        });
    tracing::info!(expired, stale_shared, "Scheduled cleanup completed");
    CleanupReport {
        expired,
        stale_shared,
    }
}

/// Drain the analytics counters into a stored snapshot.
///
/// # Returns
/// The stored snapshot, or `None` when the write failed.
pub fn run_metrics_snapshot(state: &AppState) -> Option<MetricsSnapshot> {
    let counts = state.analytics.take_counts();
    match state.db.snapshots.record(counts) {
        Ok(snapshot) => {
            tracing::info!(
                requests = snapshot.counts.requests,
                errors = snapshot.counts.errors,
                analyses = snapshot.counts.analyses,
                config_changes = snapshot.counts.config_changes,
                "Metrics snapshot stored"
            );
            Some(snapshot)
        }
        Err(err) => {
            tracing::error!("Failed to store metrics snapshot: {}", err);
            None
        }
    }
}

/// Handles for the spawned maintenance tasks.
pub struct Maintenance {
    tasks: Vec<JoinHandle<()>>,
}

impl Maintenance {
    /// Stop every task. Work in progress is abandoned.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

fn spawn_every(period: Duration, state: AppState, job: fn(&AppState)) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            job(&state);
        }
    })
}

/// Start cleanup and snapshot loops on the configured intervals.
///
/// The first run of each happens one interval after startup.
pub fn spawn_maintenance(state: AppState) -> Maintenance {
    let cleanup_every = Duration::from_secs(state.config.cleanup_interval_secs);
    let snapshot_every = Duration::from_secs(state.config.snapshot_interval_secs);
    tracing::info!(
        cleanup_secs = cleanup_every.as_secs(),
        snapshot_secs = snapshot_every.as_secs(),
        "Starting scheduled maintenance"
    );
    Maintenance {
        tasks: vec![
            spawn_every(cleanup_every, state.clone(), |state| {
                run_cleanup(state);
            }),
            spawn_every(snapshot_every, state, |state| {
                run_metrics_snapshot(state);
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Analytics, AnalyticsEvent};
    use nomoji_core::models::config::ConfigUpdate;
    use nomoji_core::models::metrics::MetricsCounts;
    use nomoji_core::{Config, Database, ManualClock, StorageBackend};
    use std::sync::Arc;

    fn memory_state() -> (AppState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = Config {
            storage: StorageBackend::Memory,
            ..Config::default()
        };
        let db = Database::in_memory(clock.clone());
        let state = AppState::with_analytics(config, db, clock.clone(), Analytics::default());
        (state, clock)
    }

    #[test]
    fn cleanup_removes_expired_and_stale_shares() {
        let (state, clock) = memory_state();
        let (old_id, _) = state
            .db
            .configs
            .share(ConfigUpdate::default())
            .expect("share");
        clock.advance(chrono::Duration::days(31));
        let (fresh_id, _) = state
            .db
            .configs
            .share(ConfigUpdate::default())
            .expect("share");

        let report = run_cleanup(&state);
        assert_eq!(
            report,
            CleanupReport {
                expired: 1,
                stale_shared: 0,
            }
        );
        assert!(state.db.configs.get_shared(&old_id).expect("get").is_none());
        assert!(state.db.configs.get_shared(&fresh_id).expect("get").is_some());
    }

    #[test]
    fn snapshot_drains_counters_into_store() {
        let (state, _clock) = memory_state();
        state.analytics.track(AnalyticsEvent::Analysis {
            has_emojis: false,
            emoji_count: 0,
            text_length: 4,
        });

        let snapshot = run_metrics_snapshot(&state).expect("snapshot");
        assert_eq!(snapshot.counts.analyses, 1);
        assert_eq!(state.analytics.take_counts(), MetricsCounts::default());
        assert_eq!(state.db.snapshots.list().expect("list"), vec![snapshot]);
    }

    #[tokio::test(start_paused = true)]
    async fn maintenance_runs_on_interval() {
        let (state, _clock) = memory_state();
        state.analytics.track(AnalyticsEvent::Analysis {
            has_emojis: true,
            emoji_count: 1,
            text_length: 2,
        });
        let maintenance = spawn_maintenance(state.clone());

        tokio::time::sleep(Duration::from_secs(state.config.snapshot_interval_secs + 1)).await;

        let snapshots = state.db.snapshots.list().expect("list");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].counts.analyses, 1);
        maintenance.shutdown();
    }
}
