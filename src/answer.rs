//! Answer generation over retrieved sources.
//!
//! [`LlmAnswerGenerator`] builds one grounding prompt from the sources and
//! their page text, then asks a [`LanguageModel`] for a cited answer. Each
//! attempt runs as its own task on the LLM [`WorkerPool`] under a timeout;
//! failures are retried with doubling backoff up to a fixed attempt count,
//! after which a canned apology is returned. The caller always gets text.

use async_trait::async_trait;
use grounded_search::{Backoff, SourceDocument, TraceId, WorkerPool};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::config::LlmConfig;
use crate::llm::{LanguageModel, LlmError};
use crate::result::{EMPTY_ANSWER_NOTICE, GENERATION_FAILED_ANSWER};

/// Produces a sourced answer for a query.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer from `sources` and the page text in `contents`.
    ///
    /// `contents[i]` belongs to `sources[i]`. Never fails: when the model is
    /// unavailable the result is [`GENERATION_FAILED_ANSWER`].
    async fn generate_answer(
        &self,
        query: &str,
        sources: &[SourceDocument],
        contents: &[String],
        trace: &TraceId,
    ) -> String;
}

/// [`AnswerGenerator`] that prompts a [`LanguageModel`].
pub struct LlmAnswerGenerator {
    model: Arc<dyn LanguageModel>,
    pool: WorkerPool,
    config: LlmConfig,
    cancel: CancellationToken,
}

impl LlmAnswerGenerator {
    /// Create a generator that runs model calls on `pool`.
    ///
    /// Cancelling `cancel` stops any pending retry.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        pool: WorkerPool,
        config: LlmConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            model,
            pool,
            config,
            cancel,
        }
    }

    /// One model call on the pool, bounded by the per-attempt timeout.
    ///
    /// The spawned task is aborted, releasing its permit, whenever this
    /// future stops waiting for it: on timeout or when the caller is dropped.
    async fn attempt(&self, prompt: Arc<str>) -> Result<String, LlmError> {
        let model = Arc::clone(&self.model);
        let model_id = self.config.model.clone();
        let handle = AbortOnDropHandle::new(
            self.pool
                .spawn(async move { model.generate(&model_id, &prompt).await }),
        );

        match tokio::time::timeout(self.config.attempt_timeout(), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(LlmError::Request(format!("generation task failed: {e}"))),
            Err(_) => Err(LlmError::Timeout(format!(
                "no reply within {}s",
                self.config.timeout_seconds
            ))),
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate_answer(
        &self,
        query: &str,
        sources: &[SourceDocument],
        contents: &[String],
        trace: &TraceId,
    ) -> String {
        let prompt: Arc<str> = Arc::from(build_prompt(query, sources, contents));
        let mut backoff = Backoff::from_millis(self.config.initial_backoff_ms);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let start = Instant::now();
            tracing::info!(
                trace_id = %trace,
                attempt,
                model = %self.config.model,
                provider = self.model.name(),
                "generation started"
            );

            match self.attempt(Arc::clone(&prompt)).await {
                Ok(answer) => {
                    tracing::info!(
                        trace_id = %trace,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        answer_chars = answer.chars().count(),
                        "generation succeeded"
                    );
                    tracing::debug!(trace_id = %trace, query, answer = %answer, "raw model answer");
                    if answer.trim().is_empty() {
                        return EMPTY_ANSWER_NOTICE.to_owned();
                    }
                    return answer;
                }
                Err(e) => {
                    tracing::warn!(
                        trace_id = %trace,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        code = e.code(),
                        error = %e,
                        "generation attempt failed"
                    );
                }
            }

            if attempt < max_attempts {
                let delay = backoff.next_delay();
                tracing::debug!(
                    trace_id = %trace,
                    delay_ms = delay.as_millis() as u64,
                    "generation retry backoff"
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        tracing::warn!(trace_id = %trace, "generation retry cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        tracing::error!(
            trace_id = %trace,
            max_attempts,
            query,
            "generation failed on every attempt"
        );
        GENERATION_FAILED_ANSWER.to_owned()
    }
}

/// Format the numbered source blocks the model answers from.
///
/// Pairs `sources[i]` with `contents[i]` up to the shorter of the two.
pub fn build_context(sources: &[SourceDocument], contents: &[String]) -> String {
    let mut context = String::new();
    for (source, content) in sources.iter().zip(contents) {
        // Writing to a String cannot fail.
        let _ = write!(
            context,
            "[{}] Title: {}\nURL: {}\nExcerpt:\n{}\n\n",
            source.id, source.title, source.url, content
        );
    }
    context
}

/// Build the full grounding prompt for `query`.
pub fn build_prompt(query: &str, sources: &[SourceDocument], contents: &[String]) -> String {
    format!(
        "You are a web-source-grounded answering assistant.\n\
         Answer using only the sources below, in the language of the question.\n\
         Cite the supporting source number at the end of each factual sentence, like [1] or [2].\n\
         Mark anything the sources do not settle as \"uncertain\".\n\
         \n\
         Question: {query}\n\
         \n\
         Sources:\n\
         {context}",
        context = build_context(sources, contents)
    )
}
