//! Core types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ranked search result returned by a [`SourceRepository`](crate::SourceRepository).
///
/// `id` is 1-based and follows provider ranking. Later stages refer to a
/// source by this id (e.g. `[2]` citations), so the order is never changed
/// after retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// 1-based rank position.
    pub id: u32,
    /// The title of the result page.
    pub title: String,
    /// The URL of the result page.
    pub url: String,
    /// Provider-supplied snippet summarising the page.
    pub snippet: String,
}

impl SourceDocument {
    /// Create a source document.
    pub fn new(
        id: u32,
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Header used to carry a [`TraceId`] across HTTP hops.
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Correlation id for one inbound request.
///
/// Carried explicitly through the call chain, forwarded on outbound search
/// requests, and recorded on the request's tracing span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a fresh 8-character trace id.
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    /// Use the inbound header value when present and non-blank, otherwise
    /// generate a new id.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_owned()),
            _ => Self::generate(),
        }
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
