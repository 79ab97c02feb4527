//! Unified error types for the crate.

use std::time::Duration;

use thiserror::Error;

/// Failure talking to (or decoding from) the cache backend.
///
/// The [`crate::ContextStore`] facade absorbs these on `get`/`put`; they only
/// reach callers from `forget`, `probe`, and construction.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis client/connection/command errors.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A backend call did not answer in time.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// JSON (de)serialization of a stored record.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Stored record decoded but violates its invariants.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Backend-specific failure without a richer type.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
