//! The pipeline's output value and its fallback predicate.

use grounded_search::SourceDocument;
use serde::{Deserialize, Serialize};

/// Answer returned when the search provider produced no sources.
pub const SEARCH_UNAVAILABLE_ANSWER: &str =
    "Could not retrieve results from the external search provider. Please try again shortly.";

/// Answer returned when every generation attempt failed.
pub const GENERATION_FAILED_ANSWER: &str = "The search was performed, but an answer could not be \
     generated right now. Please consult the sources listed below directly.";

/// Answer substituted when the model replied with blank text.
///
/// Not a fallback: the model call itself succeeded.
pub const EMPTY_ANSWER_NOTICE: &str =
    "The model returned an empty answer for now. Please check the sources listed below.";

/// A sourced answer to one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Answer text, citing sources as `[id]`.
    pub answer: String,
    /// Sources in provider rank order.
    pub sources: Vec<SourceDocument>,
}

impl AnswerResult {
    /// Build a result.
    pub fn new(answer: impl Into<String>, sources: Vec<SourceDocument>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }

    /// The result for a query whose search returned nothing.
    pub fn search_unavailable() -> Self {
        Self::new(SEARCH_UNAVAILABLE_ANSWER, Vec::new())
    }

    /// Whether this result is degraded and must never be cached or served
    /// from cache.
    ///
    /// Computed from the content every time so it cannot drift from it.
    pub fn is_fallback(&self) -> bool {
        if self.sources.is_empty() {
            return true;
        }
        let answer = self.answer.trim();
        answer == SEARCH_UNAVAILABLE_ANSWER || answer == GENERATION_FAILED_ANSWER
    }
}
