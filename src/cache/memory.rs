//! In-process answer store.
//!
//! Uses [`moka`] for async-friendly caching with a TTL and a bounded entry
//! count.

use async_trait::async_trait;
use moka::future::Cache;

use super::ResultStore;
use crate::config::CacheConfig;
use crate::result::AnswerResult;

/// Bounded in-memory store. Cloning shares the underlying cache.
#[derive(Clone)]
pub struct MemoryResultStore {
    inner: Cache<String, AnswerResult>,
}

impl std::fmt::Debug for MemoryResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResultStore")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl MemoryResultStore {
    /// Build a store from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(config.ttl())
                .build(),
        }
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn get(&self, key: &str) -> Option<AnswerResult> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: String, result: AnswerResult) {
        self.inner.insert(key, result).await;
    }

    async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    fn name(&self) -> &str {
        "memory"
    }
}
