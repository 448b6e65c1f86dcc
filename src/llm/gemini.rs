//! Gemini `generateContent` provider.
//!
//! Sends one user turn per call and joins the text parts of the first
//! candidate. No streaming, no tools, no conversation state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LanguageModel, LlmError};
use crate::config::LlmConfig;

/// Header carrying the Gemini API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// [`LanguageModel`] backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiModel {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiModel {
    /// Create a provider for the public Gemini endpoint with default
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::from_config(&LlmConfig {
            api_key: api_key.into(),
            ..LlmConfig::default()
        })
    }

    /// Set a custom base URL (for proxies or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Create a provider from application configuration.
    ///
    /// Every request is bounded by `connect_timeout_ms` and
    /// `timeout_seconds`, independently of the generator's own deadline.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.attempt_timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build Gemini client: {e}")))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Map an HTTP error status to the appropriate [`LlmError`].
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = extract_error_message(body);
        match status.as_u16() {
            401 | 403 => LlmError::Auth(format!("Gemini authentication failed: {message}")),
            429 => LlmError::RateLimited(format!("Gemini rate limited: {message}")),
            code => LlmError::Provider(format!("Gemini HTTP {code}: {message}")),
        }
    }
}

/// Extract an error message from a Gemini error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Join the text parts of the first candidate.
///
/// A response without candidates (for example a blocked prompt) yields an
/// empty string; deciding what to show for that is the caller's job.
fn parse_generate_response(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Parse(format!("invalid Gemini response: {e}")))?;

    Ok(parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("Gemini request timed out: {e}"))
                } else {
                    LlmError::Request(format!("Gemini request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| LlmError::Request(format!("Gemini response read failed: {e}")))?;
        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let text = parse_generate_response(&body_text)?;
        tracing::debug!(model, chars = text.chars().count(), "Gemini response received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
