//! # grounded-search
//!
//! Source retrieval and page-content fetching for grounded answers.
//!
//! This crate holds the pipeline stages that talk to the open web: it turns a
//! query into ranked sources through a search API and downloads the text of
//! each source page. It knows nothing about language models.
//!
//! ## Design
//!
//! - [`SourceRepository`] and [`ContentFetcher`] are the seams; the Brave
//!   Search API and plain HTTP page fetches are the implementations
//! - Every outbound call has a deadline; retryable faults are retried with
//!   doubling backoff ([`Backoff`])
//! - Page downloads run on a bounded [`WorkerPool`] shared by all requests
//! - Faults degrade to empty values instead of errors: no sources, or `""`
//!   for one page
//!
//! ## Security
//!
//! - The subscription token is sent only to the configured search API
//! - Error messages never include API keys
//! - Queries are logged at info level on stage boundaries only

pub mod config;
pub mod content;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod pool;
pub mod query;
pub mod retry;
pub mod types;

pub use config::{FetchConfig, SearchConfig};
pub use content::{extract_text, truncate_chars, ContentFetcher, HttpContentFetcher};
pub use engine::SourceRepository;
pub use engines::BraveSourceRepository;
pub use error::{Result, SearchError};
pub use pool::WorkerPool;
pub use query::{normalize, normalize_optional, Query};
pub use retry::Backoff;
pub use types::{SourceDocument, TraceId, TRACE_ID_HEADER};
