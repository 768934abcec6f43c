//! Data models shared by storage, rendering, and the HTTP layer.

/// Emoji-policy configuration documents and partial updates.
pub mod config;
/// Hourly request metrics snapshots.
pub mod metrics;
/// Default template and named presets.
pub mod presets;
/// Millisecond-precision RFC 3339 timestamp encoding.
pub mod timestamp;

#[cfg(test)]
mod tests;
