//! Brave Search API source repository.
//!
//! Calls the JSON endpoint at `{base_url}/res/v1/web/search` with a
//! subscription token. Every fault is classified into [`SearchError`] and
//! retried with backoff when retryable; the whole loop shares one deadline.
//! Callers always get a list back, empty when the provider is unusable.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

use crate::config::SearchConfig;
use crate::engine::SourceRepository;
use crate::error::{Result, SearchError};
use crate::http;
use crate::retry::Backoff;
use crate::types::{SourceDocument, TraceId, TRACE_ID_HEADER};

/// Header carrying the Brave subscription token.
const SUBSCRIPTION_TOKEN_HEADER: &str = "X-Subscription-Token";

/// [`SourceRepository`] backed by the Brave Search API.
#[derive(Debug, Clone)]
pub struct BraveSourceRepository {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl BraveSourceRepository {
    /// Build a repository from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid configuration or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_search_client(&config)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/res/v1/web/search",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// One request, classified.
    async fn fetch_once(&self, query: &str, trace: &TraceId) -> Result<Vec<SourceDocument>> {
        let count = self.config.result_count.to_string();
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("q", query), ("count", count.as_str())])
            .header(SUBSCRIPTION_TOKEN_HEADER, &self.config.api_key)
            .header(TRACE_ID_HEADER, trace.as_str())
            .send()
            .await
            .map_err(SearchError::from_transport)?;

        let status = response.status();
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::ClientFault {
                status: status.as_u16(),
                message: error_message(&message),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::ServerFault(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&message)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(SearchError::from_transport)?;
        parse_brave_response(&body)
    }

    /// Attempts plus backoff sleeps, retrying only retryable faults.
    async fn fetch_with_retry(&self, query: &str, trace: &TraceId) -> Result<Vec<SourceDocument>> {
        let mut backoff = Backoff::from_millis(self.config.initial_backoff_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.fetch_once(query, trace).await {
                Ok(sources) => return Ok(sources),
                Err(e) if e.is_retryable() && attempt <= self.config.max_retries => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        trace_id = %trace,
                        attempt,
                        fault = e.fault_kind(),
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "search attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SourceRepository for BraveSourceRepository {
    async fn get_sources(&self, normalized_query: &str, trace: &TraceId) -> Vec<SourceDocument> {
        let start = Instant::now();
        tracing::info!(trace_id = %trace, query = normalized_query, "search started");

        let deadline = self.config.deadline();
        let outcome = match tokio::time::timeout(
            deadline,
            self.fetch_with_retry(normalized_query, trace),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(SearchError::Timeout(format!(
                "search exceeded {}s deadline",
                deadline.as_secs()
            ))),
        };

        let sources = match outcome {
            Ok(sources) => sources,
            Err(e) => {
                tracing::warn!(
                    trace_id = %trace,
                    fault = e.fault_kind(),
                    error = %e,
                    "search failed, returning no sources"
                );
                Vec::new()
            }
        };

        tracing::info!(
            trace_id = %trace,
            result_count = sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search done"
        );
        sources
    }

    fn name(&self) -> &str {
        "brave"
    }
}

/// Parse a Brave Search API response body.
///
/// Ids are assigned from 1 in response order. A body without
/// `web.results` is a valid empty result.
///
/// # Errors
///
/// Returns [`SearchError::ServerFault`] if the body is not valid JSON of the
/// expected shape.
pub(crate) fn parse_brave_response(body: &str) -> Result<Vec<SourceDocument>> {
    let parsed: BraveResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::ServerFault(format!("malformed response body: {e}")))?;

    let results = parsed.web.map(|web| web.results).unwrap_or_default();
    Ok(results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            SourceDocument::new(
                index as u32 + 1,
                result.title,
                result.url,
                result.description,
            )
        })
        .collect())
}

/// Pull a readable message out of an error body.
///
/// Brave returns `{"error": {"detail": "..."}}`; anything else is passed
/// through, shortened.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("detail").or_else(|| e.get("message")))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assigns_sequential_ids() {
        let body = r#"{"web":{"results":[
            {"title":"A","url":"https://a.example","description":"first"},
            {"title":"B","url":"https://b.example","description":"second"},
            {"title":"C","url":"https://c.example","description":"third"}
        ]}}"#;
        let sources = parse_brave_response(body).expect("parse");
        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(sources[1].title, "B");
        assert_eq!(sources[1].url, "https://b.example");
        assert_eq!(sources[1].snippet, "second");
    }

    #[test]
    fn missing_results_is_empty_not_error() {
        assert!(parse_brave_response("{}").expect("parse").is_empty());
        assert!(parse_brave_response(r#"{"web":{}}"#).expect("parse").is_empty());
        assert!(parse_brave_response(r#"{"web":null}"#).expect("parse").is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let sources =
            parse_brave_response(r#"{"web":{"results":[{"url":"https://x.example"}]}}"#)
                .expect("parse");
        assert_eq!(sources[0].title, "");
        assert_eq!(sources[0].snippet, "");
    }

    #[test]
    fn invalid_json_is_server_fault() {
        let err = parse_brave_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, SearchError::ServerFault(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn error_message_prefers_detail() {
        let body = r#"{"error":{"code":"SUBSCRIPTION_TOKEN_INVALID","detail":"The provided token is invalid."}}"#;
        assert_eq!(error_message(body), "The provided token is invalid.");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("gateway down"), "gateway down");
        assert_eq!(error_message(&"x".repeat(500)).len(), 200);
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let repo = BraveSourceRepository::new(SearchConfig {
            base_url: "http://localhost:9999/".into(),
            ..Default::default()
        })
        .expect("repo");
        assert_eq!(repo.endpoint(), "http://localhost:9999/res/v1/web/search");
        assert_eq!(repo.name(), "brave");
    }

    #[test]
    fn invalid_config_rejected() {
        let result = BraveSourceRepository::new(SearchConfig {
            result_count: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
