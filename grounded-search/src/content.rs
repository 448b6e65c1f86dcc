//! Page content fetching and HTML text extraction.
//!
//! [`HttpContentFetcher`] downloads every source page in parallel on a
//! bounded [`WorkerPool`], strips boilerplate (scripts, styles, navigation),
//! finds the main content area, and returns clean readable text for the
//! answer prompt. Each page is independent: a failure yields `""` at that
//! position and never disturbs the others.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Instant;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Result, SearchError};
use crate::http;
use crate::pool::WorkerPool;
use crate::types::{SourceDocument, TraceId};

/// Downloads and extracts text for a ranked list of sources.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch one text body per source.
    ///
    /// The output has the same length and order as `sources`; an empty
    /// string marks a page that could not be fetched in time.
    async fn fetch_contents(&self, sources: &[SourceDocument], trace: &TraceId) -> Vec<String>;
}

/// [`ContentFetcher`] backed by plain HTTP GETs on a shared worker pool.
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
    pool: WorkerPool,
    config: FetchConfig,
}

impl HttpContentFetcher {
    /// Build a fetcher that runs its downloads on `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid configuration or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: FetchConfig, pool: WorkerPool) -> Result<Self> {
        config.validate()?;
        let client = http::build_page_client(&config)?;
        Ok(Self {
            client,
            pool,
            config,
        })
    }

    /// The pool downloads are dispatched on.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch_contents(&self, sources: &[SourceDocument], trace: &TraceId) -> Vec<String> {
        let start = Instant::now();
        let deadline = self.config.task_deadline();

        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let client = self.client.clone();
                let url = source.url.clone();
                let max_chars = self.config.max_chars;
                self.pool.spawn_with_deadline(deadline, async move {
                    fetch_page(&client, &url, max_chars).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let contents: Vec<String> = joined
            .into_iter()
            .zip(sources)
            .map(|(outcome, source)| match outcome {
                Ok(Some(Ok(text))) => text,
                Ok(Some(Err(e))) => {
                    tracing::debug!(
                        trace_id = %trace,
                        source_id = source.id,
                        url = %source.url,
                        fault = e.fault_kind(),
                        error = %e,
                        "page fetch failed"
                    );
                    String::new()
                }
                Ok(None) => {
                    tracing::debug!(
                        trace_id = %trace,
                        source_id = source.id,
                        url = %source.url,
                        deadline_ms = deadline.as_millis() as u64,
                        "page fetch exceeded deadline"
                    );
                    String::new()
                }
                Err(e) => {
                    tracing::warn!(
                        trace_id = %trace,
                        source_id = source.id,
                        error = %e,
                        "page fetch task did not complete"
                    );
                    String::new()
                }
            })
            .collect();

        let fetched = contents.iter().filter(|c| !c.is_empty()).count();
        tracing::info!(
            trace_id = %trace,
            requested = sources.len(),
            fetched,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "content fetch done"
        );
        contents
    }
}

/// Download one page and return its extracted, truncated text.
async fn fetch_page(client: &reqwest::Client, url: &str, max_chars: usize) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| SearchError::Content(format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SearchError::Content(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(SearchError::from_transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Content(format!("HTTP {status}")));
    }

    if let Some(content_type) = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_markup(content_type) {
            return Err(SearchError::Content(format!(
                "unsupported content type: {content_type}"
            )));
        }
    }

    let html = response.text().await.map_err(SearchError::from_transport)?;
    let text = extract_text(&html)?;
    Ok(truncate_chars(&text, max_chars))
}

/// Whether a `Content-Type` value names something we can extract text from.
fn is_markup(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("html") || lower.contains("xml") || lower.starts_with("text/")
}

/// Extract readable text from raw HTML.
///
/// Strips boilerplate elements, prefers `<article>`, then `<main>`, then
/// `[role="main"]`, then `<body>`, and collapses whitespace.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_text(html: &str) -> Result<String> {
    let cleaned_html = strip_boilerplate_tags(html);
    let document = Html::parse_document(&cleaned_html);

    let text = normalise_whitespace(&extract_main_text(&document));
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable content found".into()));
    }
    Ok(text)
}

/// Keep at most `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, not bytes, so multi-byte scripts keep the
/// same visible length as ASCII.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => text[..byte_end].to_owned(),
        None => text.to_owned(),
    }
}

/// Extract text from the main content area of the document.
fn extract_main_text(document: &Html) -> String {
    let content_selectors = ["article", "main", "[role=\"main\"]", "body"];

    for selector_str in &content_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }

    String::new()
}

/// Remove boilerplate HTML elements and their content before parsing.
fn strip_boilerplate_tags(html: &str) -> String {
    let tags = [
        "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
        "form",
    ];

    let mut result = html.to_owned();
    for tag in &tags {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of one HTML element and its content.
///
/// Matching is ASCII case-insensitive. `to_ascii_lowercase` keeps byte
/// offsets identical between `html` and `lower`.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // <navigate> is not <nav>.
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}

/// Collapse excess whitespace: runs of spaces become one, 3+ newlines become 2.
fn normalise_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count: u32 = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            newline_count += 1;
            prev_was_space = false;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if ch.is_whitespace() {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(ch);
        }
    }

    result
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_content_from_article() {
        let html = r#"<html><body>
            <nav>Navigation stuff</nav>
            <article>Article content here</article>
            <footer>Footer stuff</footer>
        </body></html>"#;
        let text = extract_text(html).expect("extract");
        assert!(text.contains("Article content"));
        assert!(!text.contains("Navigation"));
        assert!(!text.contains("Footer"));
    }

    #[test]
    fn fallback_to_body() {
        let text = extract_text("<html><body>Body content only</body></html>").expect("extract");
        assert_eq!(text, "Body content only");
    }

    #[test]
    fn strip_script_and_style() {
        let html = r#"<html><body>
            <p>Real content</p>
            <script>var x = 1; alert('hi');</script>
            <STYLE>.foo { color: red; }</STYLE>
        </body></html>"#;
        let text = extract_text(html).expect("extract");
        assert!(text.contains("Real content"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn strip_nav_footer_header_aside() {
        let html = r#"<html><body>
            <header>Header content</header>
            <nav>Nav links</nav>
            <main>Main content</main>
            <aside>Sidebar stuff</aside>
            <footer>Footer info</footer>
        </body></html>"#;
        let text = extract_text(html).expect("extract");
        assert_eq!(text, "Main content");
    }

    #[test]
    fn nav_tag_not_confused_with_similar_tags() {
        let html = "<html><body><nav>Skip this</nav><p>Keep this navigate text</p></body></html>";
        let text = extract_text(html).expect("extract");
        assert!(!text.contains("Skip this"));
        assert!(text.contains("navigate text"));
    }

    #[test]
    fn non_ascii_text_survives_stripping() {
        let html = "<html><body><script>x</script><p>검색 결과 İstanbul</p></body></html>";
        let text = extract_text(html).expect("extract");
        assert_eq!(text, "검색 결과 İstanbul");
    }

    #[test]
    fn empty_html_returns_parse_error() {
        let err = extract_text("").unwrap_err();
        assert!(err.to_string().contains("no extractable content"));
    }

    #[test]
    fn whitespace_only_html_returns_parse_error() {
        assert!(extract_text("<html><body>   \n\n\n   </body></html>").is_err());
    }

    #[test]
    fn whitespace_normalisation() {
        let text =
            extract_text("<html><body>Word1    Word2\n\n\n\n\nWord3</body></html>").expect("extract");
        assert!(!text.contains("  "));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let text = "가".repeat(10);
        let truncated = truncate_chars(&text, 4);
        assert_eq!(truncated.chars().count(), 4);
        assert_eq!(truncated, "가가가가");
    }

    #[test]
    fn truncate_short_text_untouched() {
        assert_eq!(truncate_chars("short", 2000), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn markup_content_types() {
        assert!(is_markup("text/html; charset=utf-8"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(is_markup("text/plain"));
        assert!(!is_markup("application/pdf"));
        assert!(!is_markup("image/png"));
    }

    #[tokio::test]
    async fn non_http_url_is_a_content_fault() {
        let client = reqwest::Client::new();
        let err = fetch_page(&client, "ftp://example.com/file", 100)
            .await
            .unwrap_err();
        assert_eq!(err.fault_kind(), "content");
    }

    #[tokio::test]
    async fn empty_source_list_yields_empty_output() {
        let fetcher = HttpContentFetcher::new(FetchConfig::default(), WorkerPool::new("fetch", 2))
            .expect("fetcher");
        let contents = fetcher.fetch_contents(&[], &TraceId::generate()).await;
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn invalid_url_yields_empty_slot() {
        let fetcher = HttpContentFetcher::new(FetchConfig::default(), WorkerPool::new("fetch", 2))
            .expect("fetcher");
        let sources = [SourceDocument::new(1, "Bad", "not a url", "")];
        let contents = fetcher.fetch_contents(&sources, &TraceId::generate()).await;
        assert_eq!(contents, vec![String::new()]);
    }
}
