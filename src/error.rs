//! Error types for the grounded application.
//!
//! Pipeline stages never surface errors to callers; they degrade to fallback
//! values instead. [`GroundedError`] covers what can still fail outside the
//! pipeline: loading configuration, building components, binding the server.

use grounded_search::SearchError;

use crate::llm::LlmError;

/// Top-level error type for application setup and serving.
#[derive(Debug, thiserror::Error)]
pub enum GroundedError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search or fetch component could not be built.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Language model component could not be built.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// HTTP server error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, GroundedError>;
