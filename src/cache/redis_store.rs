//! Redis answer store.
//!
//! Values are the JSON form of [`AnswerResult`], written with `SET .. EX`
//! so the server expires them after `cache.ttl_seconds`. The connection is
//! opened lazily on first use and shared afterwards; every round trip,
//! including that first connect, is bounded by `cache.redis_timeout_ms`.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::ResultStore;
use crate::config::CacheConfig;
use crate::error::{GroundedError, Result};
use crate::result::AnswerResult;

/// Namespace for answer keys.
const KEY_PREFIX: &str = "grounded:answer:";

fn store_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// Store backed by a Redis server.
pub struct RedisResultStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    ttl_seconds: u64,
    op_timeout: Duration,
}

impl std::fmt::Debug for RedisResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisResultStore")
            .field("connected", &self.conn.initialized())
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl RedisResultStore {
    /// Create a store for `config.redis_url`. Does not connect yet.
    ///
    /// # Errors
    ///
    /// Returns [`GroundedError::Config`] if the URL is rejected.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| GroundedError::Config(format!("cache.redis_url rejected: {e}")))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            ttl_seconds: config.ttl_seconds,
            op_timeout: config.redis_timeout(),
        })
    }

    async fn connection(&self) -> redis::RedisResult<ConnectionManager> {
        self.conn
            .get_or_try_init(|| self.client.get_connection_manager())
            .await
            .cloned()
    }

    /// Run one command under the store deadline. Faults are logged and
    /// come back as `None`.
    async fn run<T, F, Fut>(&self, op: &'static str, command: F) -> Option<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let work = async {
            let conn = self.connection().await?;
            command(conn).await
        };
        match tokio::time::timeout(self.op_timeout, work).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(op, error = %e, "redis cache operation failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    op,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "redis cache operation timed out"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ResultStore for RedisResultStore {
    async fn get(&self, key: &str) -> Option<AnswerResult> {
        let key = store_key(key);
        let raw = self
            .run("get", |mut conn| async move {
                conn.get::<_, Option<String>>(key).await
            })
            .await
            .flatten()?;

        match serde_json::from_str(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable cached answer, treating as miss");
                None
            }
        }
    }

    async fn insert(&self, key: String, result: AnswerResult) {
        let value = match serde_json::to_string(&result) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode answer for cache");
                return;
            }
        };
        let key = store_key(&key);
        let ttl = self.ttl_seconds;
        self.run("set", |mut conn| async move {
            conn.set_ex::<_, _, ()>(key, value, ttl).await
        })
        .await;
    }

    async fn invalidate(&self, key: &str) {
        let key = store_key(key);
        self.run("del", |mut conn| async move { conn.del::<_, ()>(key).await })
            .await;
    }

    fn name(&self) -> &str {
        "redis"
    }
}
