//! Fire-and-forget usage analytics with pluggable sinks.

use nomoji_core::models::metrics::MetricsCounts;
use nomoji_core::models::presets::Preset;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// One analytics data point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    Request {
        method: String,
        path: String,
        status: u16,
        duration_ms: u64,
        user_agent: Option<String>,
    },
    ConfigChange {
        user_id: String,
        /// `create`, `update` or `delete`.
        action: &'static str,
        preset: Option<Preset>,
    },
    Analysis {
        has_emojis: bool,
        emoji_count: usize,
        text_length: usize,
    },
    Error {
        path: String,
        status: u16,
        message: String,
    },
}

impl AnalyticsEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::ConfigChange { .. } => "config_change",
            Self::Analysis { .. } => "analysis",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Error)]
#[error("analytics sink failed: {0}")]
pub struct SinkError(pub String);

/// Destination for analytics events.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &AnalyticsEvent) -> Result<(), SinkError>;
}

/// Emits events as structured `tracing` records on `nomoji::analytics`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        match event {
            AnalyticsEvent::Request {
                method,
                path,
                status,
                duration_ms,
                user_agent,
            } => tracing::info!(
                target: "nomoji::analytics",
                event = "request",
                method = method.as_str(),
                path = path.as_str(),
                status = *status,
                duration_ms = *duration_ms,
                user_agent = user_agent.as_deref().unwrap_or("unknown"),
            ),
            AnalyticsEvent::ConfigChange {
                user_id,
                action,
                preset,
            } => tracing::info!(
                target: "nomoji::analytics",
                event = "config_change",
                user_id = user_id.as_str(),
                action = *action,
                preset = preset.map(Preset::name).unwrap_or("none"),
            ),
            AnalyticsEvent::Analysis {
                has_emojis,
                emoji_count,
                text_length,
            } => tracing::info!(
                target: "nomoji::analytics",
                event = "analysis",
                has_emojis = *has_emojis,
                emoji_count = *emoji_count,
                text_length = *text_length,
            ),
            AnalyticsEvent::Error {
                path,
                status,
                message,
            } => tracing::info!(
                target: "nomoji::analytics",
                event = "error",
                path = path.as_str(),
                status = *status,
                message = message.as_str(),
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    errors: AtomicU64,
    analyses: AtomicU64,
    config_changes: AtomicU64,
}

/// Fan-out over sinks plus the counters drained by the snapshot task.
///
/// Tracking never fails the caller: sink errors are logged and dropped.
#[derive(Default)]
pub struct Analytics {
    sinks: Vec<Arc<dyn AnalyticsSink>>,
    counters: Counters,
}

impl Analytics {
    pub fn new(sinks: Vec<Arc<dyn AnalyticsSink>>) -> Self {
        Self {
            sinks,
            counters: Counters::default(),
        }
    }

    /// Analytics backed by the tracing sink.
    pub fn tracing() -> Self {
        Self::new(vec![Arc::new(TracingSink)])
    }

    /// Whether any sink is attached.
    pub fn is_enabled(&self) -> bool {
        !self.sinks.is_empty()
    }

    pub fn track(&self, event: AnalyticsEvent) {
        let counter = match &event {
            AnalyticsEvent::Request { .. } => &self.counters.requests,
            AnalyticsEvent::ConfigChange { .. } => &self.counters.config_changes,
            AnalyticsEvent::Analysis { .. } => &self.counters.analyses,
            AnalyticsEvent::Error { .. } => &self.counters.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        for sink in &self.sinks {
            if let Err(err) = sink.record(&event) {
                tracing::warn!(event = event.kind(), "Dropping analytics event: {}", err);
            }
        }
    }

    /// Counters accumulated since the previous call; resets them to zero.
    pub fn take_counts(&self) -> MetricsCounts {
        MetricsCounts {
            requests: self.counters.requests.swap(0, Ordering::Relaxed),
            errors: self.counters.errors.swap(0, Ordering::Relaxed),
            analyses: self.counters.analyses.swap(0, Ordering::Relaxed),
            config_changes: self.counters.config_changes.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        kinds: Mutex<Vec<&'static str>>,
    }

    impl AnalyticsSink for RecordingSink {
        fn record(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
            self.kinds.lock().expect("sink lock").push(event.kind());
            Ok(())
        }
    }

    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        fn record(&self, _event: &AnalyticsEvent) -> Result<(), SinkError> {
            Err(SinkError("unreachable collector".to_string()))
        }
    }

    fn analysis() -> AnalyticsEvent {
        AnalyticsEvent::Analysis {
            has_emojis: true,
            emoji_count: 2,
            text_length: 17,
        }
    }

    #[test]
    fn failing_sink_does_not_block_other_sinks() {
        let recording = Arc::new(RecordingSink::default());
        let analytics = Analytics::new(vec![Arc::new(FailingSink), recording.clone()]);

        analytics.track(analysis());

        assert_eq!(*recording.kinds.lock().expect("sink lock"), vec!["analysis"]);
    }

    #[test]
    fn take_counts_drains_counters() {
        let analytics = Analytics::default();
        assert!(!analytics.is_enabled());

        analytics.track(analysis());
        analytics.track(AnalyticsEvent::ConfigChange {
            user_id: "alice".to_string(),
            action: "update",
            preset: Some(Preset::Strict),
        });
        analytics.track(AnalyticsEvent::Error {
            path: "/api/analyze".to_string(),
            status: 400,
            message: "Invalid JSON body.".to_string(),
        });

        let counts = analytics.take_counts();
        assert_eq!(
            counts,
            MetricsCounts {
                requests: 0,
                errors: 1,
                analyses: 1,
                config_changes: 1,
            }
        );
        assert_eq!(analytics.take_counts(), MetricsCounts::default());
    }
}
