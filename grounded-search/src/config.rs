//! Search and page-fetch configuration with sensible defaults.
//!
//! [`SearchConfig`] controls the search API call and its retry policy.
//! [`FetchConfig`] controls page downloading and truncation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SearchError;

/// Configuration for the search provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the Brave Search API.
    pub base_url: String,
    /// Subscription token. Usually supplied via `SEARCH_API_KEY`.
    pub api_key: String,
    /// Number of results requested from the provider.
    pub result_count: u32,
    /// Overall deadline in seconds spanning every attempt and backoff sleep.
    pub timeout_seconds: u64,
    /// Additional attempts after the first, for retryable faults only.
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubles on each retry.
    pub initial_backoff_ms: u64,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.search.brave.com".to_owned(),
            api_key: String::new(),
            result_count: 3,
            timeout_seconds: 8,
            max_retries: 2,
            initial_backoff_ms: 200,
            connect_timeout_ms: 2000,
            request_timeout_ms: 3000,
        }
    }
}

impl SearchConfig {
    /// Overall deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `base_url` must be an http(s) URL
    /// - `result_count` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `request_timeout_ms` and `connect_timeout_ms` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| SearchError::Config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SearchError::Config(
                "base_url must use http or https".into(),
            ));
        }
        if self.result_count == 0 {
            return Err(SearchError::Config(
                "result_count must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(SearchError::Config(
                "request_timeout_ms and connect_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for fetching result pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of pages that may be downloaded at once, process-wide.
    pub pool_size: usize,
    /// Per-request HTTP timeout in milliseconds.
    pub http_timeout_ms: u64,
    /// Deadline per page in milliseconds, measured from dispatch.
    pub task_timeout_ms: u64,
    /// Maximum characters of extracted text kept per page.
    pub max_chars: usize,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            http_timeout_ms: 3000,
            task_timeout_ms: 4000,
            max_chars: 2000,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Per-page deadline as a [`Duration`].
    pub fn task_deadline(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.pool_size == 0 {
            return Err(SearchError::Config(
                "pool_size must be greater than 0".into(),
            ));
        }
        if self.http_timeout_ms == 0 || self.task_timeout_ms == 0 {
            return Err(SearchError::Config(
                "http_timeout_ms and task_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.max_chars == 0 {
            return Err(SearchError::Config(
                "max_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_search_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.result_count, 3);
        assert_eq!(config.timeout_seconds, 8);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.initial_backoff_ms, 200);
        assert_eq!(config.deadline(), Duration::from_secs(8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_result_count_rejected() {
        let config = SearchConfig {
            result_count: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("result_count"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let config = SearchConfig {
            base_url: "ftp://search.example".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn garbage_base_url_rejected() {
        let config = SearchConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_is_valid() {
        let config = SearchConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_fetch_config_has_sensible_values() {
        let config = FetchConfig::default();
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.max_chars, 2000);
        assert_eq!(config.task_deadline(), Duration::from_millis(4000));
        assert!(config.user_agent.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_pool_size_rejected() {
        let config = FetchConfig {
            pool_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn zero_max_chars_rejected() {
        let config = FetchConfig {
            max_chars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"api_key":"k","max_retries":5}"#).expect("deserialize");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.result_count, 3);
    }
}
