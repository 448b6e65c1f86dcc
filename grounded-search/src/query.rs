//! Query normalisation.
//!
//! The normalised form is the cache key and the dedup granularity for the
//! whole pipeline: two spellings of the same query must collide.

/// A query as typed by the user together with its canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The query exactly as received.
    pub raw: String,
    /// Output of [`normalize`] applied to `raw`.
    pub normalized: String,
}

impl Query {
    /// Build a query, normalising the raw text.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }
}

/// Canonicalise a raw query: trim, lowercase, and collapse whitespace runs
/// to a single space.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`. Lowercasing is
/// Unicode-aware but leaves scripts without case (Hangul, CJK) untouched.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`normalize`], mapping an absent query to `""`.
pub fn normalize_optional(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}
