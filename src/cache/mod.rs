//! Stores for finished answers.
//!
//! Answers are keyed by the normalised query. Two stores exist:
//! - [`MemoryResultStore`]: bounded in-process `moka` cache (default)
//! - [`RedisResultStore`]: shared Redis server, behind the `redis` feature
//!
//! A store accepts any value it is given. Keeping degraded results out is
//! the orchestrator's job, so every store sees the same write pattern.
//! Store faults never reach the caller: a failed read is a miss and a
//! failed write is dropped, both logged by the store.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryResultStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisResultStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::Result;
use crate::result::AnswerResult;

/// Key-value store for [`AnswerResult`]s.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Look up the answer for a normalised query.
    async fn get(&self, key: &str) -> Option<AnswerResult>;

    /// Store an answer, replacing any previous one for the key.
    async fn insert(&self, key: String, result: AnswerResult);

    /// Remove the answer for a key, if any.
    async fn invalidate(&self, key: &str);

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

/// Build the store selected by `config.backend`.
///
/// # Errors
///
/// Returns [`GroundedError::Config`](crate::error::GroundedError::Config) if the backend is unavailable in this
/// build or its connection settings are rejected.
pub fn build_store(config: &CacheConfig) -> Result<Arc<dyn ResultStore>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryResultStore::new(config))),
        #[cfg(feature = "redis")]
        CacheBackend::Redis => Ok(Arc::new(RedisResultStore::new(config)?)),
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(crate::error::GroundedError::Config(
            "cache.backend = \"redis\" needs the `redis` cargo feature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_memory() {
        let store = build_store(&CacheConfig::default()).expect("store");
        assert_eq!(store.name(), "memory");
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn redis_backend_needs_feature() {
        use crate::error::GroundedError;

        let config = CacheConfig {
            backend: CacheBackend::Redis,
            ..Default::default()
        };
        assert!(matches!(build_store(&config), Err(GroundedError::Config(_))));
    }

    #[cfg(feature = "redis")]
    #[test]
    fn redis_backend_builds_without_connecting() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:1".into(),
            ..Default::default()
        };
        let store = build_store(&config).expect("store");
        assert_eq!(store.name(), "redis");
    }
}
