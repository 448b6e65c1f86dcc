//! HTTP server binary for grounded answers.
//!
//! Loads configuration from the path in the first argument or the default
//! config path, overlays API keys from the environment, and serves until
//! Ctrl-C.

use std::path::PathBuf;

use grounded::config::AppConfig;
use grounded::{SearchOrchestrator, SearchServer};
use tokio_util::sync::CancellationToken;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "grounded=info,grounded_search=info,tower_http=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = load_config()?;
    if config.search.api_key.is_empty() {
        tracing::warn!("SEARCH_API_KEY is not set; every search will degrade to no sources");
    }
    if config.llm.api_key.is_empty() {
        tracing::warn!("LLM_API_KEY is not set; answers will fall back to the apology text");
    }

    let cancel = CancellationToken::new();
    let orchestrator = SearchOrchestrator::from_config(&config, cancel.clone())
        .map_err(|e| anyhow::anyhow!("failed to build pipeline: {e}"))?;
    let server = SearchServer::start(orchestrator, &config.server)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start server: {e}"))?;

    tracing::info!(addr = %server.addr(), "grounded-server started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    cancel.cancel();
    server.shutdown();

    tracing::info!("grounded-server shut down cleanly");
    Ok(())
}

/// Read the config file if it exists, then apply the environment.
fn load_config() -> anyhow::Result<AppConfig> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_config_path);

    let mut config = if path.exists() {
        tracing::info!(path = %path.display(), "loading config");
        AppConfig::from_file(&path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?
    } else {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        AppConfig::default()
    };
    config.apply_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;
    Ok(config)
}
