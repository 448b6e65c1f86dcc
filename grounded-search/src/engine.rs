//! Trait definition for pluggable source retrieval backends.
//!
//! A [`SourceRepository`] turns a normalised query into ranked
//! [`SourceDocument`]s. Implementations absorb every fault themselves: the
//! contract is a value, possibly empty, never an error.

use async_trait::async_trait;

use crate::types::{SourceDocument, TraceId};

/// A search backend that produces ranked sources for a query.
///
/// Each implementation handles its own:
///
/// - request construction and authentication
/// - fault classification and retry policy
/// - overall deadline
/// - degradation to an empty list when all of the above fail
///
/// All implementations must be `Send + Sync` so one instance can serve
/// concurrent requests.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Retrieve sources for an already-normalised query.
    ///
    /// Ids are assigned from 1 in provider rank order. Returns an empty
    /// vector when the provider cannot be reached or rejects the request.
    async fn get_sources(&self, normalized_query: &str, trace: &TraceId) -> Vec<SourceDocument>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
