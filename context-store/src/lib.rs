//! Session-scoped cache of document contexts.
//!
//! [`ContextStore`] maps a session id to the [`DocumentContext`] built for it,
//! under the key `context:{session_id}` with a fixed TTL. The facade never
//! lets a backend failure abort a request:
//!
//! - `get` failures read as a miss (the caller rebuilds from source),
//! - `put` failures are logged and dropped (the caller keeps its in-memory value),
//! - `forget` of an absent session succeeds.

mod backend;
mod config;
mod errors;
mod memory;
mod record;
mod redis_backend;

pub use backend::ContextBackend;
pub use config::{BackendKind, DEFAULT_TTL, StoreConfig};
pub use errors::StoreError;
pub use memory::MemoryBackend;
pub use record::DocumentContext;
pub use redis_backend::RedisBackend;

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info, warn};

/// Cache key for a session's context.
pub fn context_key(session_id: &str) -> String {
    format!("context:{session_id}")
}

/// Facade over a [`ContextBackend`]; cheap to clone.
#[derive(Clone)]
pub struct ContextStore {
    backend: Arc<dyn ContextBackend>,
    ttl: Duration,
}

/// Result of a write/read-back round trip through the backend.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub backend: &'static str,
    pub test_key: String,
    pub stored_value: String,
    pub retrieved_value: Option<String>,
    pub matches: bool,
}

impl ContextStore {
    pub fn new(backend: Arc<dyn ContextBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// In-memory store with the default two-hour TTL.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached context for `session_id`, or `None` on miss.
    ///
    /// Backend and decoding failures are logged and reported as a miss.
    pub async fn get(&self, session_id: &str) -> Option<DocumentContext> {
        let key = context_key(session_id);
        let raw = match self.backend.get_raw(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(session_id, "context cache miss");
                return None;
            }
            Err(e) => {
                warn!(session_id, backend = self.backend.name(), error = %e, "cache unavailable on get; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<DocumentContext>(&raw) {
            Ok(ctx) => {
                info!(session_id, length = ctx.total_length(), "context found in cache");
                Some(ctx)
            }
            Err(e) => {
                warn!(session_id, error = %e, "cached context is unreadable; treating as miss");
                None
            }
        }
    }

    /// Stores `ctx` for `session_id` with the configured TTL.
    ///
    /// Returns whether the value was persisted; failures are logged only.
    pub async fn put(&self, session_id: &str, ctx: &DocumentContext) -> bool {
        let key = context_key(session_id);
        let raw = match serde_json::to_string(ctx) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id, error = %e, "failed to encode context; not cached");
                return false;
            }
        };

        match self.backend.put_raw(&key, raw, self.ttl).await {
            Ok(()) => {
                info!(session_id, ttl_secs = self.ttl.as_secs(), "context cached");
                true
            }
            Err(e) => {
                warn!(session_id, backend = self.backend.name(), error = %e, "cache unavailable on put; context not persisted");
                false
            }
        }
    }

    /// Drops the context of `session_id`. Returns whether one existed.
    ///
    /// # Errors
    /// Only backend failures; an absent session is `Ok(false)`.
    pub async fn forget(&self, session_id: &str) -> Result<bool, StoreError> {
        let removed = self.backend.delete(&context_key(session_id)).await?;
        debug!(session_id, removed, "context forgotten");
        Ok(removed)
    }

    /// Writes a probe value and reads it back (60 s TTL).
    pub async fn probe(&self) -> Result<ProbeReport, StoreError> {
        let test_key = format!("test_{}", chrono::Utc::now().timestamp());
        let stored_value = "Cache is working!".to_string();
        self.backend
            .put_raw(&test_key, stored_value.clone(), Duration::from_secs(60))
            .await?;
        let retrieved_value = self.backend.get_raw(&test_key).await?;
        Ok(ProbeReport {
            backend: self.backend.name(),
            matches: retrieved_value.as_deref() == Some(stored_value.as_str()),
            test_key,
            stored_value,
            retrieved_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that fails every call.
    struct DownBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContextBackend for DownBackend {
        fn name(&self) -> &'static str {
            "down"
        }
        async fn get_raw(&self, _: &str) -> Result<Option<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn put_raw(&self, _: &str, _: String, _: Duration) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(context_key("session_abc"), "context:session_abc");
    }

    #[tokio::test]
    async fn roundtrip_and_forget_is_idempotent() {
        let store = ContextStore::in_memory();
        let ctx = DocumentContext::new("texto", "https://x/doc.pdf");
        assert!(store.put("s1", &ctx).await);
        assert_eq!(store.get("s1").await, Some(ctx));
        assert!(store.get("s2").await.is_none());

        assert!(store.forget("s1").await.unwrap());
        assert!(!store.forget("s1").await.unwrap());
        assert!(!store.forget("never-existed").await.unwrap());
        assert!(store.get("s1").await.is_none());
    }

    #[tokio::test]
    async fn backend_failures_are_soft() {
        let backend = Arc::new(DownBackend {
            calls: AtomicUsize::new(0),
        });
        let store = ContextStore::new(backend.clone(), DEFAULT_TTL);
        let ctx = DocumentContext::new("texto", "u");

        assert!(store.get("s").await.is_none());
        assert!(!store.put("s", &ctx).await);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(store.forget("s").await.is_err());
        assert!(store.probe().await.is_err());
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_miss() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .put_raw(&context_key("s"), "{not json".into(), DEFAULT_TTL)
            .await
            .unwrap();
        let store = ContextStore::new(backend, DEFAULT_TTL);
        assert!(store.get("s").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn contexts_expire_after_ttl() {
        let store = ContextStore::new(Arc::new(MemoryBackend::new()), Duration::from_secs(7200));
        store.put("s", &DocumentContext::new("t", "u")).await;
        tokio::time::advance(Duration::from_secs(7199)).await;
        assert!(store.get("s").await.is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("s").await.is_none());
    }

    #[tokio::test]
    async fn probe_reads_back_value() {
        let report = ContextStore::in_memory().probe().await.unwrap();
        assert!(report.matches);
        assert_eq!(report.backend, "memory");
    }
}
