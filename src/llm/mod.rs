//! Language model seam.
//!
//! [`LanguageModel`] is the one call the answer generator needs: a model id
//! and a single prompt in, completion text out. [`GeminiModel`] implements it
//! against the Gemini `generateContent` API.

pub mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiModel;

/// Stable error codes for programmatic error handling.
///
/// These codes never change and form part of the public API contract.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Authentication failed (invalid/missing API key).
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// The provider is throttling requests.
    pub const RATE_LIMITED: &str = "RATE_LIMITED";

    /// Request to the provider failed at the transport level.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// Provider-specific error not covered by other variants.
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";

    /// Request or operation timed out.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Response body did not have the expected shape.
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
}

/// Errors produced by language model calls.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// Authentication failed (HTTP 401/403).
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    Auth(String),

    /// The provider returned HTTP 429.
    #[error("[{}] {}", error_codes::RATE_LIMITED, .0)]
    RateLimited(String),

    /// Connection or transport failure.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    Request(String),

    /// Any other non-success status from the provider.
    #[error("[{}] {}", error_codes::PROVIDER_ERROR, .0)]
    Provider(String),

    /// The call did not finish in time.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Response body did not have the expected shape.
    #[error("[{}] {}", error_codes::PARSE_ERROR, .0)]
    Parse(String),
}

impl LlmError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::Auth(_) => error_codes::AUTH_FAILED,
            Self::RateLimited(_) => error_codes::RATE_LIMITED,
            Self::Request(_) => error_codes::REQUEST_FAILED,
            Self::Provider(_) => error_codes::PROVIDER_ERROR,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Parse(_) => error_codes::PARSE_ERROR,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Auth(m)
            | Self::RateLimited(m)
            | Self::Request(m)
            | Self::Provider(m)
            | Self::Timeout(m)
            | Self::Parse(m) => m,
        }
    }

    /// Returns true if this error represents a transient failure.
    ///
    /// Configuration and authentication failures need a fix, not a retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Auth(_))
    }
}

/// A text completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` with `model` and return the generated text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
