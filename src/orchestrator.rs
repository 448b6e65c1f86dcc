//! The answer pipeline.
//!
//! ```text
//! normalize → cache lookup ─┬─ hit (not fallback) → return
//!                           └─ miss / fallback hit
//!                                 → retrieve sources ─┬─ empty → search-unavailable result
//!                                                     └─ fetch contents → generate answer
//!                                                          → build result → cache unless fallback
//! ```
//!
//! Stages run one after another; only content fetching fans out. No stage
//! returns an error, so every call yields an [`AnswerResult`].

use grounded_search::{
    BraveSourceRepository, ContentFetcher, HttpContentFetcher, Query, SourceRepository, TraceId,
    WorkerPool,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::answer::{AnswerGenerator, LlmAnswerGenerator};
use crate::cache::{ResultStore, build_store};
use crate::config::AppConfig;
use crate::error::Result;
use crate::llm::GeminiModel;
use crate::result::AnswerResult;

/// Runs the pipeline for one query at a time per call; safe to share.
#[derive(Clone)]
pub struct SearchOrchestrator {
    sources: Arc<dyn SourceRepository>,
    fetcher: Arc<dyn ContentFetcher>,
    generator: Arc<dyn AnswerGenerator>,
    cache: Arc<dyn ResultStore>,
}

impl SearchOrchestrator {
    /// Assemble an orchestrator from its stages.
    pub fn new(
        sources: Arc<dyn SourceRepository>,
        fetcher: Arc<dyn ContentFetcher>,
        generator: Arc<dyn AnswerGenerator>,
        cache: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            sources,
            fetcher,
            generator,
            cache,
        }
    }

    /// Build the production pipeline: Brave search, HTTP page fetching on a
    /// fetch pool, Gemini generation on an LLM pool, and the configured
    /// answer store.
    ///
    /// Both pools are created here once and shared by every request.
    /// Cancelling `cancel` stops pending generation retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &AppConfig, cancel: CancellationToken) -> Result<Self> {
        config.validate()?;

        let sources = BraveSourceRepository::new(config.search.clone())?;

        let fetch_pool = WorkerPool::new("fetch", config.fetch.pool_size);
        let fetcher = HttpContentFetcher::new(config.fetch.clone(), fetch_pool)?;

        let llm_pool = WorkerPool::new("llm", config.llm.pool_size);
        let model = Arc::new(GeminiModel::from_config(&config.llm)?);
        let generator = LlmAnswerGenerator::new(model, llm_pool, config.llm.clone(), cancel);

        let cache = build_store(&config.cache)?;
        tracing::info!(store = cache.name(), "answer store ready");

        Ok(Self::new(
            Arc::new(sources),
            Arc::new(fetcher),
            Arc::new(generator),
            cache,
        ))
    }

    /// The answer store.
    pub fn cache(&self) -> &dyn ResultStore {
        self.cache.as_ref()
    }

    /// Answer `raw_query`, from cache when a good answer is stored.
    ///
    /// Runs inside a span carrying `trace_id`.
    pub async fn search(&self, raw_query: &str, trace: &TraceId) -> AnswerResult {
        let span = tracing::info_span!("search", trace_id = %trace);
        self.run(raw_query, trace).instrument(span).await
    }

    async fn run(&self, raw_query: &str, trace: &TraceId) -> AnswerResult {
        let total = Instant::now();
        let query = Query::new(raw_query);
        let key = query.normalized.as_str();

        if key.is_empty() {
            tracing::info!("blank query, pipeline skipped");
            return AnswerResult::search_unavailable();
        }

        match self.cache.get(key).await {
            Some(cached) if !cached.is_fallback() => {
                tracing::info!(query = key, "cache hit");
                return cached;
            }
            Some(_) => {
                tracing::warn!(query = key, "fallback result found in cache, discarding");
                self.cache.invalidate(key).await;
            }
            None => tracing::debug!(query = key, "cache miss"),
        }

        let stage = Instant::now();
        let sources = self.sources.get_sources(key, trace).await;
        let search_ms = stage.elapsed().as_millis() as u64;

        if sources.is_empty() {
            tracing::warn!(
                query = key,
                search_ms,
                total_ms = total.elapsed().as_millis() as u64,
                "no sources, returning search-unavailable answer"
            );
            return AnswerResult::search_unavailable();
        }

        let stage = Instant::now();
        let contents = self.fetcher.fetch_contents(&sources, trace).await;
        let fetch_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let answer = self
            .generator
            .generate_answer(key, &sources, &contents, trace)
            .await;
        let llm_ms = stage.elapsed().as_millis() as u64;

        let result = AnswerResult::new(answer, sources);
        let fallback = result.is_fallback();
        if fallback {
            tracing::warn!(query = key, "fallback answer, not caching");
        } else {
            self.cache.insert(key.to_owned(), result.clone()).await;
        }

        tracing::info!(
            query = key,
            source_count = result.sources.len(),
            fallback,
            search_ms,
            fetch_ms,
            llm_ms,
            total_ms = total.elapsed().as_millis() as u64,
            "pipeline done"
        );
        result
    }
}
