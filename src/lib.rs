//! Grounded: source-cited answers over live web search.
//!
//! This crate answers a question with a cascaded pipeline:
//! Query → Search → Page fetch → LLM → Cached answer
//!
//! # Architecture
//!
//! The stages are independent components behind traits, run in order by
//! [`SearchOrchestrator`]:
//! - **Search**: ranked sources from the Brave Search API (`grounded-search`)
//! - **Page fetch**: readable text for each source, in parallel on a bounded
//!   pool (`grounded-search`)
//! - **LLM**: a cited answer from Gemini, with retry and timeout
//! - **Cache**: finished answers in `moka` or Redis, never degraded ones
//!
//! Every stage has a fallback value, so a query always produces an
//! [`AnswerResult`].

pub mod answer;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod result;
pub mod server;

pub use answer::{AnswerGenerator, LlmAnswerGenerator};
pub use cache::{MemoryResultStore, ResultStore, build_store};
#[cfg(feature = "redis")]
pub use cache::RedisResultStore;
pub use config::AppConfig;
pub use error::{GroundedError, Result};
pub use llm::{GeminiModel, LanguageModel, LlmError};
pub use orchestrator::SearchOrchestrator;
pub use result::{
    AnswerResult, EMPTY_ANSWER_NOTICE, GENERATION_FAILED_ANSWER, SEARCH_UNAVAILABLE_ANSWER,
};
pub use server::SearchServer;
