//! Key-value backend abstraction.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Raw string KV operations the store needs from a cache backend.
///
/// Implement this trait to plug in another shared cache. Implementations do
/// not need to be idempotent-aware: the facade handles soft failure.
#[async_trait]
pub trait ContextBackend: Send + Sync {
    /// Short backend name for diagnostics (e.g. `memory`, `redis`).
    fn name(&self) -> &'static str;

    /// Returns the value under `key`, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, expiring `ttl` from now (no sliding).
    async fn put_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`; returns whether something was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}
