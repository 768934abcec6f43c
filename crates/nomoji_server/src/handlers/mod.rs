//! HTTP request handlers.

/// Emoji analysis endpoint.
pub mod analyze;
/// Per-user configuration endpoints.
pub mod config;
pub(crate) mod deprecation;
/// Rendered rule documents.
pub mod rules;
/// Shareable configuration snapshots.
pub mod shared;
/// Health, API info and presets.
pub mod system;
