//! Redis backend, shared between server instances.
//!
//! The connection is established lazily on first use through a
//! `ConnectionManager` (which reconnects on its own), so an unavailable Redis
//! at start-up only turns requests into cache misses. Every command is
//! bounded by `op_timeout`.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{backend::ContextBackend, errors::StoreError};

pub struct RedisBackend {
    client: redis::Client,
    conn: RwLock<Option<ConnectionManager>>,
    prefix: String,
    op_timeout: Duration,
}

impl RedisBackend {
    /// Parses the URL; does not connect yet.
    ///
    /// # Errors
    /// Returns [`StoreError::Redis`] if `url` is not a valid Redis URL.
    pub fn new(url: &str, prefix: impl Into<String>, op_timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            conn: RwLock::new(None),
            prefix: prefix.into(),
            op_timeout,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn conn(&self) -> Result<ConnectionManager, StoreError> {
        if let Some(c) = self.conn.read().await.as_ref() {
            return Ok(c.clone());
        }
        let mut w = self.conn.write().await;
        if let Some(c) = w.as_ref() {
            return Ok(c.clone());
        }
        let c = self
            .bounded(self.client.get_connection_manager())
            .await?;
        info!("redis connection established");
        *w = Some(c.clone());
        Ok(c)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl ContextBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut c = self.conn().await?;
        let key = self.prefixed(key);
        self.bounded(c.get::<_, Option<String>>(&key)).await
    }

    async fn put_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut c = self.conn().await?;
        let key = self.prefixed(key);
        let secs = ttl.as_secs().max(1);
        debug!(%key, ttl_secs = secs, bytes = value.len(), "redis SETEX");
        self.bounded(c.set_ex::<_, _, ()>(&key, value, secs)).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut c = self.conn().await?;
        let key = self.prefixed(key);
        let removed: u64 = self.bounded(c.del(&key)).await?;
        Ok(removed > 0)
    }
}
