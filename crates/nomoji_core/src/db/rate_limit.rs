//! Fixed-window request counters kept in the key-value store.

use super::kv::{get_json, put_json, KvStore};
use crate::clock::Clock;
use crate::constants::RATE_LIMIT_PREFIX;
use crate::error::AppError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named request budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Every `/api` request.
    Moderate,
    /// POST, PUT and DELETE on top of `Moderate`.
    Writes,
}

impl RateLimitTier {
    pub fn name(self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Writes => "writes",
        }
    }

    /// Requests allowed per window.
    pub fn max_requests(self) -> u32 {
        match self {
            Self::Moderate => 100,
            Self::Writes => 20,
        }
    }

    pub fn window(self) -> Duration {
        Duration::seconds(60)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Counter {
    count: u32,
    reset_at_ms: i64,
}

/// Budget state after counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub tier: RateLimitTier,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Whole seconds until the window resets, at least 1.
    pub retry_after_secs: u64,
}

/// Outcome of [`RateLimitStore::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(RateLimitStatus),
    Limited(RateLimitStatus),
}

impl RateLimitDecision {
    pub fn status(&self) -> &RateLimitStatus {
        match self {
            Self::Allowed(status) | Self::Limited(status) => status,
        }
    }
}

fn ceil_secs(ms: i64) -> i64 {
    (ms.max(0) + 999) / 1000
}

/// Counter store for rate limiting.
///
/// The read and the write of a check are separate operations, so concurrent
/// requests for one identity can overshoot the budget slightly.
pub struct RateLimitStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimitStore {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Count one request from `identity` against `tier`.
    ///
    /// # Arguments
    /// - `tier`: Budget to charge.
    /// - `identity`: Caller key such as `user:alice` or `ip:203.0.113.7`.
    ///
    /// # Returns
    /// [`RateLimitDecision::Limited`] once the window's budget is spent;
    /// limited requests are not counted.
    ///
    /// # Errors
    /// Returns an error when the counter cannot be read or written.
    pub fn check(
        &self,
        tier: RateLimitTier,
        identity: &str,
    ) -> Result<RateLimitDecision, AppError> {
        let key = format!("{}{}:{}", RATE_LIMIT_PREFIX, tier.name(), identity);
        let now_ms = self.clock.now().timestamp_millis();
        let limit = tier.max_requests();

        let counter = match get_json::<Counter>(self.kv.as_ref(), &key)? {
            Some(counter) if now_ms <= counter.reset_at_ms => {
                if counter.count >= limit {
                    let status = self.status(tier, counter, now_ms);
                    return Ok(RateLimitDecision::Limited(status));
                }
                Counter {
                    count: counter.count + 1,
                    ..counter
                }
            }
            _ => Counter {
                count: 1,
                reset_at_ms: now_ms + tier.window().num_milliseconds(),
            },
        };

        let ttl_secs = ceil_secs(counter.reset_at_ms - now_ms).saturating_add(10).max(60);
        put_json(
            self.kv.as_ref(),
            &key,
            &counter,
            Some(std::time::Duration::from_secs(ttl_secs.unsigned_abs())),
        )?;

        Ok(RateLimitDecision::Allowed(self.status(tier, counter, now_ms)))
    }

    fn status(&self, tier: RateLimitTier, counter: Counter, now_ms: i64) -> RateLimitStatus {
        let limit = tier.max_requests();
        RateLimitStatus {
            tier,
            limit,
            remaining: limit.saturating_sub(counter.count),
            reset_at: Utc
                .timestamp_millis_opt(counter.reset_at_ms)
                .single()
                .unwrap_or_else(|| self.clock.now()),
            retry_after_secs: ceil_secs(counter.reset_at_ms - now_ms).max(1).unsigned_abs(),
        }
    }
}
