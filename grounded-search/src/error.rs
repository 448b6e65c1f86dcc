//! Error types for the grounded-search crate.
//!
//! Every failure an outbound call can produce is classified into one of the
//! variants below. The retry loops match on the variant (see
//! [`SearchError::is_retryable`]) instead of inspecting messages.
//! No API keys or sensitive data appear in error messages.

/// Errors that can occur while retrieving sources or page content.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider rejected the request (HTTP 4xx). Never retried.
    #[error("client fault (HTTP {status}): {message}")]
    ClientFault {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider response body or description.
        message: String,
    },

    /// The provider failed (HTTP 5xx), the connection failed, or the body
    /// could not be decoded.
    #[error("server fault: {0}")]
    ServerFault(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A page could not be fetched or turned into text.
    #[error("content fault: {0}")]
    Content(String),

    /// Failed to parse HTML or JSON into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP client construction or transport error outside the fault taxonomy.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl SearchError {
    /// Returns true if another attempt might succeed.
    ///
    /// Only server-side and deadline faults qualify; a malformed request
    /// will not start working on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerFault(_) | Self::Timeout(_))
    }

    /// Short stable label used in log fields.
    pub fn fault_kind(&self) -> &'static str {
        match self {
            Self::ClientFault { .. } => "client",
            Self::ServerFault(_) => "server",
            Self::Timeout(_) => "timeout",
            Self::Content(_) => "content",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::Http(_) => "http",
        }
    }

    /// Classify a transport-level [`reqwest::Error`].
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::ServerFault(format!("malformed response body: {err}"))
        } else {
            Self::ServerFault(format!("request failed: {err}"))
        }
    }
}

/// Convenience type alias for grounded-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
