//! Aggregated request counters persisted once per snapshot interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counter totals accumulated since the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsCounts {
    pub requests: u64,
    pub errors: u64,
    pub analyses: u64,
    pub config_changes: u64,
}

/// One persisted metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(with = "super::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub counts: MetricsCounts,
}
