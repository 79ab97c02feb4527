//! Runtime configuration for the store.

use std::{sync::Arc, time::Duration};

use crate::{
    ContextStore, backend::ContextBackend, errors::StoreError, memory::MemoryBackend,
    redis_backend::RedisBackend,
};

/// Contexts live two hours from creation.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
}

impl std::str::FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "array" | "" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(StoreError::Config(format!("unsupported cache backend `{other}`"))),
        }
    }
}

/// Store configuration. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub redis_url: String,
    pub key_prefix: String,
    pub ttl: Duration,
    pub op_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis_url: "redis://127.0.0.1:6379".into(),
            key_prefix: "doc_chat:".into(),
            ttl: DEFAULT_TTL,
            op_timeout: Duration::from_secs(2),
        }
    }
}

impl StoreConfig {
    /// Reads `CACHE_BACKEND`, `REDIS_URL`, `CACHE_PREFIX`, `CONTEXT_TTL_SECS`,
    /// `CACHE_OP_TIMEOUT_MS`.
    ///
    /// # Errors
    /// Returns [`StoreError::Config`] for an unknown backend or a zero TTL.
    pub fn from_env() -> Result<Self, StoreError> {
        let dflt = Self::default();
        let backend = std::env::var("CACHE_BACKEND")
            .unwrap_or_default()
            .parse::<BackendKind>()?;
        let ttl = Duration::from_secs(parse("CONTEXT_TTL_SECS", dflt.ttl.as_secs()));
        if ttl.is_zero() {
            return Err(StoreError::Config("CONTEXT_TTL_SECS must be > 0".into()));
        }

        Ok(Self {
            backend,
            redis_url: std::env::var("REDIS_URL").unwrap_or(dflt.redis_url),
            key_prefix: std::env::var("CACHE_PREFIX").unwrap_or(dflt.key_prefix),
            ttl,
            op_timeout: Duration::from_millis(parse(
                "CACHE_OP_TIMEOUT_MS",
                dflt.op_timeout.as_millis() as u64,
            )),
        })
    }

    /// Builds the facade over the configured backend.
    pub fn build(&self) -> Result<ContextStore, StoreError> {
        let backend: Arc<dyn ContextBackend> = match self.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Redis => Arc::new(RedisBackend::new(
                &self.redis_url,
                self.key_prefix.clone(),
                self.op_timeout,
            )?),
        };
        Ok(ContextStore::new(backend, self.ttl))
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
