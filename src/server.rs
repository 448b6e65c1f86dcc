//! JSON HTTP boundary.
//!
//! ## Endpoints
//!
//! - `GET /` redirects to `/search`
//! - `GET /search?q=...` runs the pipeline and returns `{query, result}`
//! - `GET /healthz` returns `ok`
//!
//! Each request gets a [`TraceId`] from the inbound `X-Trace-Id` header or a
//! fresh one, passed to the orchestrator and echoed on the response.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::get;
use grounded_search::{TraceId, normalize_optional};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

use crate::config::ServerConfig;
use crate::error::{GroundedError, Result};
use crate::orchestrator::SearchOrchestrator;
use crate::result::AnswerResult;

/// Request and response header carrying the trace id.
const TRACE_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Query string of `GET /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// The user's question. Absent or blank skips the pipeline.
    #[serde(default)]
    pub q: Option<String>,
}

/// Body of a `GET /search` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as received, or `null` when none was given.
    pub query: Option<String>,
    /// The answer, or `null` when the pipeline was skipped.
    pub result: Option<AnswerResult>,
}

#[derive(Clone)]
struct AppState {
    orchestrator: SearchOrchestrator,
}

/// A running HTTP server.
pub struct SearchServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl SearchServer {
    /// Start the HTTP server.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(orchestrator: SearchOrchestrator, config: &ServerConfig) -> Result<Self> {
        let app = router(orchestrator);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| GroundedError::Server(format!("bind to {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| GroundedError::Server(format!("failed to get local addr: {e}")))?;

        info!("search server listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("search server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Build the application router.
pub fn router(orchestrator: SearchOrchestrator) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/search", get(handle_search))
        .route("/healthz", get(handle_health))
        .with_state(AppState { orchestrator })
}

async fn handle_root() -> Redirect {
    Redirect::to("/search")
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Response {
    let trace = TraceId::from_header(headers.get(&TRACE_HEADER).and_then(|v| v.to_str().ok()));
    let span = tracing::info_span!("request", trace_id = %trace);

    let result = async {
        info!("request start");
        let result = match params.q.as_deref() {
            Some(q) if !normalize_optional(Some(q)).is_empty() => {
                Some(state.orchestrator.search(q, &trace).await)
            }
            _ => None,
        };
        info!(answered = result.is_some(), "request end");
        result
    }
    .instrument(span)
    .await;

    let mut response = Json(SearchResponse {
        query: params.q,
        result,
    })
    .into_response();
    if let Ok(value) = HeaderValue::from_str(trace.as_str()) {
        response.headers_mut().insert(TRACE_HEADER, value);
    }
    response
}
