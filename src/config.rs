//! Configuration types for the grounded answer service.
//!
//! [`AppConfig`] aggregates every section. It loads from TOML, overlays API
//! keys from the environment, and validates before any component is built.

use grounded_search::{FetchConfig, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GroundedError, Result};

/// Environment variable holding the search provider subscription token.
pub const SEARCH_API_KEY_ENV: &str = "SEARCH_API_KEY";

/// Environment variable holding the language model API key.
pub const LLM_API_KEY_ENV: &str = "LLM_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search provider call.
    pub search: SearchConfig,
    /// Result page fetching.
    pub fetch: FetchConfig,
    /// Answer generation.
    pub llm: LlmConfig,
    /// Result cache.
    pub cache: CacheConfig,
    /// Inbound HTTP server.
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Language model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider base URL.
    pub base_url: String,
    /// API key. Usually supplied via `LLM_API_KEY`.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-attempt timeout in seconds. Also bounds each HTTP request.
    pub timeout_seconds: u64,
    /// TCP/TLS connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// First backoff delay in milliseconds; doubles on each retry.
    pub initial_backoff_ms: u64,
    /// Concurrent generation calls allowed process-wide.
    pub pool_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_owned(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_owned(),
            timeout_seconds: 12,
            connect_timeout_ms: 2000,
            max_attempts: 2,
            initial_backoff_ms: 300,
            pool_size: 8,
        }
    }
}

impl LlmConfig {
    /// Per-attempt timeout as a [`Duration`].
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validates this section.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| GroundedError::Config(format!("llm.base_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GroundedError::Config(
                "llm.base_url must use http or https".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(GroundedError::Config("llm.model must not be empty".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(GroundedError::Config(
                "llm.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(GroundedError::Config(
                "llm.connect_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(GroundedError::Config(
                "llm.max_attempts must be at least 1".into(),
            ));
        }
        if self.pool_size == 0 {
            return Err(GroundedError::Config(
                "llm.pool_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Where finished answers are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Bounded in-process cache.
    #[default]
    Memory,
    /// Shared Redis server. Requires the `redis` cargo feature.
    Redis,
}

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store implementation.
    pub backend: CacheBackend,
    /// Time-to-live per entry, in seconds.
    pub ttl_seconds: u64,
    /// Maximum number of cached answers (memory backend).
    pub max_entries: u64,
    /// Connection URL (redis backend).
    pub redis_url: String,
    /// Deadline for each store round trip in milliseconds (redis backend).
    pub redis_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl_seconds: 600,
            max_entries: 1000,
            redis_url: "redis://127.0.0.1:6379".to_owned(),
            redis_timeout_ms: 500,
        }
    }
}

impl CacheConfig {
    /// Entry time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Per-operation store deadline as a [`Duration`].
    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }

    /// Validates this section.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds == 0 || self.max_entries == 0 {
            return Err(GroundedError::Config(
                "cache.ttl_seconds and cache.max_entries must be greater than 0".into(),
            ));
        }
        if self.backend == CacheBackend::Redis {
            let parsed = url::Url::parse(&self.redis_url).map_err(|e| {
                GroundedError::Config(format!("cache.redis_url is not a valid URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "redis" | "rediss") {
                return Err(GroundedError::Config(
                    "cache.redis_url must use redis or rediss".into(),
                ));
            }
            if self.redis_timeout_ms == 0 {
                return Err(GroundedError::Config(
                    "cache.redis_timeout_ms must be greater than 0".into(),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on. `0` lets the OS pick one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| GroundedError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GroundedError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/grounded/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("grounded").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("grounded")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/grounded-config/config.toml")
        }
    }

    /// Overlay API keys from `SEARCH_API_KEY` and `LLM_API_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay API keys using `lookup` in place of the process environment.
    ///
    /// Blank values are ignored so an empty variable never erases a key
    /// from the file.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(SEARCH_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.search.api_key = key;
        }
        if let Some(key) = lookup(LLM_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = key;
        }
    }

    /// Validates every section.
    ///
    /// API keys are not required here; an empty key surfaces as a provider
    /// fault at request time and degrades like any other.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.fetch.validate()?;
        self.llm.validate()?;
        self.cache.validate()?;
        if self.server.host.trim().is_empty() {
            return Err(GroundedError::Config("server.host must not be empty".into()));
        }
        Ok(())
    }
}
