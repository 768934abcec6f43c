//! Storage tests covering both backends, expiry, and update semantics.

use super::*;
use crate::clock::ManualClock;
use crate::models::config::{ConfigUpdate, Severity};
use crate::models::metrics::MetricsCounts;
use crate::models::presets::{default_config, Preset};
use chrono::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use tempfile::TempDir;

fn setup_test_db() -> (Database, Arc<ManualClock>, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let clock = Arc::new(ManualClock::starting_now());
    let db_path = temp_dir.path().join("db");
    let db = Database::open(db_path.to_str().expect("utf-8 path"), clock.clone()).expect("open db");
    (db, clock, temp_dir)
}

fn setup_memory_db() -> (Database, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    (Database::in_memory(clock.clone()), clock)
}

fn enabled_only(enabled: bool) -> ConfigUpdate {
    ConfigUpdate {
        enabled: Some(enabled),
        ..ConfigUpdate::default()
    }
}

#[test]
fn get_or_create_materializes_default_without_persisting() {
    let (db, clock) = setup_memory_db();

    let first = db.configs.get_or_create("alice").unwrap();
    assert_eq!(first.contexts, default_config().contexts);
    let meta = first.metadata.clone().expect("metadata");
    assert_eq!(meta.created_at, meta.updated_at);
    assert_eq!(meta.user_id.as_deref(), Some("alice"));
    assert!(db.configs.get("alice").unwrap().is_none());

    clock.advance(Duration::seconds(5));
    let second = db.configs.get_or_create("alice").unwrap();
    let second_meta = second.metadata.clone().expect("metadata");
    assert!(second_meta.updated_at >= meta.updated_at);
    assert_eq!(
        crate::models::config::Configuration {
            metadata: None,
            ..first
        },
        crate::models::config::Configuration {
            metadata: None,
            ..second
        }
    );
}

#[test]
fn update_preserves_created_at_and_advances_updated_at() {
    let (db, clock, _temp) = setup_test_db();

    let (created, kind) = db.configs.update("bob", enabled_only(false)).unwrap();
    assert_eq!(kind, WriteKind::Created);
    let created_meta = created.metadata.clone().unwrap();
    assert!(!created.enabled);

    clock.advance(Duration::minutes(3));
    let (updated, kind) = db.configs.update("bob", enabled_only(true)).unwrap();
    assert_eq!(kind, WriteKind::Updated);
    let updated_meta = updated.metadata.clone().unwrap();
    assert_eq!(updated_meta.created_at, created_meta.created_at);
    assert!(updated_meta.updated_at > created_meta.updated_at);

    let stored = db.configs.get("bob").unwrap().expect("stored");
    assert_eq!(stored, updated);
}

#[test]
fn updated_at_strictly_increases_when_clock_stalls() {
    let (db, _clock) = setup_memory_db();

    let (first, _) = db.configs.update("carol", enabled_only(true)).unwrap();
    let (second, _) = db.configs.update("carol", enabled_only(false)).unwrap();
    let (third, _) = db.configs.update("carol", enabled_only(true)).unwrap();

    let stamps: Vec<_> = [first, second, third]
        .iter()
        .map(|config| config.metadata.as_ref().unwrap().updated_at)
        .collect();
    assert!(stamps[0] < stamps[1]);
    assert!(stamps[1] < stamps[2]);
}

#[test]
fn update_contexts_replaces_whole_map() {
    let (db, _clock) = setup_memory_db();
    db.configs.apply_preset("dave", Preset::Relaxed).unwrap();

    let update: ConfigUpdate = serde_json::from_value(serde_json::json!({
        "contexts": {"comments": {"enabled": true, "severity": "strict"}}
    }))
    .unwrap();
    let (merged, _) = db.configs.update("dave", update).unwrap();

    assert_eq!(merged.contexts.comments.severity, Severity::Strict);
    // Omitted contexts come from the default template, not from the relaxed record.
    assert_eq!(merged.contexts.console, default_config().contexts.console);
}

#[test]
fn apply_preset_keeps_custom_rules() {
    let (db, _clock) = setup_memory_db();
    let rules = ConfigUpdate {
        custom_rules: Some(vec!["No emoji in YAML".to_string()]),
        ..ConfigUpdate::default()
    };
    db.configs.update("erin", rules).unwrap();

    let (config, _) = db.configs.apply_preset("erin", Preset::Strict).unwrap();
    assert_eq!(config.contexts.documentation.severity, Severity::Strict);
    assert!(config.allowed_contexts().is_empty());
    assert_eq!(config.custom_rules(), ["No emoji in YAML".to_string()]);

    let reread = db.configs.get_or_create("erin").unwrap();
    assert_eq!(reread.contexts.documentation.severity, Severity::Strict);
}

#[test]
fn delete_reverts_to_default_template() {
    let (db, _clock, _temp) = setup_test_db();
    db.configs.update("frank", enabled_only(false)).unwrap();
    assert!(db.configs.delete("frank").unwrap());
    assert!(!db.configs.delete("frank").unwrap());

    let config = db.configs.get_or_create("frank").unwrap();
    assert!(config.enabled);
}

#[test]
fn list_users_strips_key_prefix() {
    let (db, _clock) = setup_memory_db();
    db.configs.update("zed", enabled_only(true)).unwrap();
    db.configs.update("amy", enabled_only(true)).unwrap();
    db.configs.share(ConfigUpdate::default()).unwrap();

    assert_eq!(db.configs.list_users().unwrap(), vec!["amy", "zed"]);
}

#[test]
fn shared_config_expires_after_thirty_days() {
    let (db, clock, _temp) = setup_test_db();
    let (id, stored) = db.configs.share(enabled_only(false)).unwrap();

    clock.advance(Duration::days(29));
    let fetched = db.configs.get_shared(&id).unwrap().expect("still live");
    assert_eq!(fetched, stored);

    clock.advance(Duration::days(1));
    assert!(db.configs.get_shared(&id).unwrap().is_none());
    assert_eq!(db.kv.purge_expired().unwrap(), 1);
}

#[test]
fn sweep_removes_only_old_shared_configs() {
    let (db, clock) = setup_memory_db();
    let (old_id, mut old) = db.configs.share(ConfigUpdate::default()).unwrap();
    // Backdate the record beyond the sweep horizon while keeping it live in the store.
    let meta = old.metadata.as_mut().unwrap();
    meta.created_at = meta.created_at - Duration::days(45);
    db.configs.save_shared(&old_id, &old).unwrap();

    clock.advance(Duration::hours(1));
    let (fresh_id, _) = db.configs.share(ConfigUpdate::default()).unwrap();

    assert_eq!(db.configs.sweep_stale_shared(Duration::days(30)).unwrap(), 1);
    assert!(db.configs.get_shared(&old_id).unwrap().is_none());
    assert!(db.configs.get_shared(&fresh_id).unwrap().is_some());
}

#[test]
fn redb_store_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");
    let path = path.to_str().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());

    {
        let db = Database::open(path, clock.clone()).unwrap();
        db.configs.update("gina", enabled_only(false)).unwrap();
    }

    let reopened = Database::open(path, clock).unwrap();
    let config = reopened.configs.get("gina").unwrap().expect("persisted");
    assert!(!config.enabled);
    assert!(std::path::Path::new(path).join(REDB_FILE_NAME).exists());
}

#[test]
fn kv_backends_agree_on_prefix_listing_and_expiry() {
    let (redb_db, redb_clock, _temp) = setup_test_db();
    let (mem_db, mem_clock) = setup_memory_db();

    for (kv, clock) in [
        (redb_db.kv.clone(), redb_clock),
        (mem_db.kv.clone(), mem_clock),
    ] {
        kv.put("a:1", b"one", None).unwrap();
        kv.put("a:2", b"two", Some(std::time::Duration::from_secs(10))).unwrap();
        kv.put("b:1", b"three", None).unwrap();
        assert_eq!(kv.list_keys("a:").unwrap(), vec!["a:1", "a:2"]);

        clock.advance(Duration::seconds(10));
        assert_eq!(kv.get("a:2").unwrap(), None);
        assert_eq!(kv.list_keys("a:").unwrap(), vec!["a:1"]);
        assert!(!kv.delete("a:2").unwrap());
        assert_eq!(kv.purge_expired().unwrap(), 0);
        assert_eq!(kv.get("a:1").unwrap().as_deref(), Some(&b"one"[..]));
    }
}

#[test]
fn rate_limit_counts_until_budget_spent_then_resets() {
    let (db, clock) = setup_memory_db();
    let tier = RateLimitTier::Writes;

    for expected_remaining in (0..tier.max_requests()).rev() {
        match db.rate_limits.check(tier, "user:hank").unwrap() {
            RateLimitDecision::Allowed(status) => {
                assert_eq!(status.remaining, expected_remaining)
            }
            RateLimitDecision::Limited(_) => panic!("limited too early"),
        }
    }

    let limited = db.rate_limits.check(tier, "user:hank").unwrap();
    let RateLimitDecision::Limited(status) = limited else {
        panic!("expected limit");
    };
    assert_eq!(status.remaining, 0);
    assert_eq!(status.retry_after_secs, 60);

    // Other identities have their own budget.
    assert!(matches!(
        db.rate_limits.check(tier, "ip:198.51.100.4").unwrap(),
        RateLimitDecision::Allowed(_)
    ));

    clock.advance(Duration::seconds(61));
    let RateLimitDecision::Allowed(status) = db.rate_limits.check(tier, "user:hank").unwrap() else {
        panic!("window should have reset");
    };
    assert_eq!(status.remaining, tier.max_requests() - 1);
}

#[test]
fn snapshots_expire_after_a_week() {
    let (db, clock) = setup_memory_db();
    let counts = MetricsCounts {
        requests: 12,
        errors: 1,
        analyses: 3,
        config_changes: 2,
    };
    let snapshot = db.snapshots.record(counts.clone()).unwrap();
    assert_eq!(db.snapshots.list().unwrap(), vec![snapshot]);

    clock.advance(Duration::days(7));
    assert!(db.snapshots.list().unwrap().is_empty());
}

/// Makes the first two readers wait for each other so both observe the
/// same pre-write state.
struct InterleavingKv {
    inner: MemoryKv,
    barrier: Barrier,
    arrivals: AtomicUsize,
}

impl KvStore for InterleavingKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let value = self.inner.get(key)?;
        if self.arrivals.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait();
        }
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<std::time::Duration>) -> Result<(), AppError> {
        self.inner.put(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.inner.delete(key)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        self.inner.list_keys(prefix)
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        self.inner.purge_expired()
    }
}

#[test]
fn concurrent_updates_are_last_writer_wins() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());
    let kv = Arc::new(InterleavingKv {
        inner: MemoryKv::new(clock.clone()),
        barrier: Barrier::new(2),
        arrivals: AtomicUsize::new(0),
    });
    let db = Arc::new(Database::from_store(kv, clock));

    let db_a = db.clone();
    let disable = thread::spawn(move || {
        db_a.configs.update("ivy", enabled_only(false)).unwrap();
    });
    let db_b = db.clone();
    let add_rules = thread::spawn(move || {
        let update = ConfigUpdate {
            custom_rules: Some(vec!["rule from b".to_string()]),
            ..ConfigUpdate::default()
        };
        db_b.configs.update("ivy", update).unwrap();
    });
    disable.join().unwrap();
    add_rules.join().unwrap();

    let last = db.configs.get("ivy").unwrap().expect("stored");
    let disable_survived = !last.enabled;
    let rules_survived = last.custom_rules.is_some();
    // Both writers merged over the same default, so exactly one change is lost.
    assert!(disable_survived ^ rules_survived);
}
