//! Brave Search API contract tests.
//!
//! Verify request format, fault classification, the retry budget, and the
//! empty-list fallback against a local mock server.

use std::time::{Duration, Instant};

use grounded_search::{BraveSourceRepository, SearchConfig, SourceRepository, TraceId};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SearchConfig {
    SearchConfig {
        base_url: server.uri(),
        api_key: "test-token".into(),
        initial_backoff_ms: 10,
        ..Default::default()
    }
}

fn three_results() -> serde_json::Value {
    json!({
        "web": {
            "results": [
                {"title": "Rust", "url": "https://rust-lang.org", "description": "A language"},
                {"title": "Book", "url": "https://doc.rust-lang.org/book", "description": "The book"},
                {"title": "Crates", "url": "https://crates.io", "description": "Registry"}
            ]
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Request format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sends_query_count_token_and_trace_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(query_param("q", "rust async"))
        .and(query_param("count", "3"))
        .and(header("X-Subscription-Token", "test-token"))
        .and(header("X-Trace-Id", "trace-01"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .expect(1)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    let trace = TraceId::from_header(Some("trace-01"));
    let sources = repo.get_sources("rust async", &trace).await;

    assert_eq!(sources.len(), 3);
}

#[tokio::test]
async fn maps_results_with_sequential_ids_in_rank_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    let sources = repo.get_sources("rust", &TraceId::generate()).await;

    let ids: Vec<u32> = sources.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(sources[0].title, "Rust");
    assert_eq!(sources[1].url, "https://doc.rust-lang.org/book");
    assert_eq!(sources[2].snippet, "Registry");
}

#[tokio::test]
async fn missing_web_results_yields_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "search"})))
        .expect(1)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    assert!(repo.get_sources("nothing", &TraceId::generate()).await.is_empty());
}

// ────────────────────────────────────────────────────────────────────────────
// Fault classification and retry budget
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn client_fault_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "VALIDATION", "detail": "Unable to validate request parameter(s)"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    assert!(repo.get_sources("bad", &TraceId::generate()).await.is_empty());
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    assert!(repo.get_sources("q", &TraceId::generate()).await.is_empty());
}

#[tokio::test]
async fn server_fault_uses_full_retry_budget() {
    let server = MockServer::start().await;

    // One attempt plus max_retries (2).
    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    let start = Instant::now();
    let sources = repo.get_sources("q", &TraceId::generate()).await;

    assert!(sources.is_empty());
    assert!(start.elapsed() < Duration::from_secs(8));
}

#[tokio::test]
async fn malformed_body_is_retried_as_server_fault() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    assert!(repo.get_sources("q", &TraceId::generate()).await.is_empty());
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .expect(1)
        .mount(&server)
        .await;

    let repo = BraveSourceRepository::new(config_for(&server)).expect("repo");
    let sources = repo.get_sources("q", &TraceId::generate()).await;
    assert_eq!(sources.len(), 3);
}

#[tokio::test]
async fn request_timeout_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(three_results())
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = SearchConfig {
        request_timeout_ms: 100,
        max_retries: 1,
        ..config_for(&server)
    };
    let repo = BraveSourceRepository::new(config).expect("repo");
    assert!(repo.get_sources("q", &TraceId::generate()).await.is_empty());
}

#[tokio::test]
async fn overall_deadline_bounds_the_whole_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(three_results())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = SearchConfig {
        timeout_seconds: 1,
        request_timeout_ms: 10_000,
        ..config_for(&server)
    };
    let repo = BraveSourceRepository::new(config).expect("repo");

    let start = Instant::now();
    let sources = repo.get_sources("q", &TraceId::generate()).await;

    assert!(sources.is_empty());
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn unreachable_provider_yields_empty_list() {
    let config = SearchConfig {
        // Port 9 (discard) is almost never listening.
        base_url: "http://127.0.0.1:9".into(),
        api_key: "k".into(),
        initial_backoff_ms: 1,
        ..Default::default()
    };
    let repo = BraveSourceRepository::new(config).expect("repo");
    assert!(repo.get_sources("q", &TraceId::generate()).await.is_empty());
}
