//! Request middleware applied by [`crate::create_app`].

/// Error envelope rewriting and non-production error detail.
pub mod error_detail;
/// Request ids, timing headers, request logs and analytics.
pub mod observability;
/// Per-identity request budgets on `/api/*`.
pub mod rate_limit;
/// Body size guard.
pub mod size_limit;
