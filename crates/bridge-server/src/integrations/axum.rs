//! Axum web framework integration.
//!
//! Exposes the bridge as three endpoints:
//!
//! - `POST /api/chat` - run a request against the backend, streamed as SSE
//! - `GET /health` - liveness check naming the active backend
//! - `GET /` - API info: name, version, endpoints, supported UI actions
//!
//! The chat endpoint always answers `200` with an event stream; run
//! failures and validation errors travel inside the stream as `RUN_ERROR`
//! events, so clients parse one uniform shape regardless of outcome.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bridge_server::backends::ToolflowBackend;
//! use bridge_server::integrations::axum::BridgeRouter;
//! use bridge_server::llm::{ChatClient, LlmConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LlmConfig::from_env().expect("GROQ_API_KEY must be set");
//!     let client = ChatClient::new(reqwest::Client::new(), config);
//!     let backend = Arc::new(ToolflowBackend::new(client));
//!
//!     let app = BridgeRouter::new(backend).into_router();
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use crate::backends::Backend;
use crate::orchestrator::{self, StreamOptions};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use bridge_core::RunRequest;
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

/// Shared state passed to all handlers.
#[derive(Clone)]
pub struct BridgeState {
    backend: Arc<dyn Backend>,
    options: StreamOptions,
}

impl BridgeState {
    pub fn new(backend: Arc<dyn Backend>, options: StreamOptions) -> Self {
        Self { backend, options }
    }
}

/// Router builder for the bridge endpoints.
///
/// # Example
///
/// ```rust,no_run
/// # use bridge_server::integrations::axum::BridgeRouter;
/// # use bridge_server::backends::{Backend, ToolflowBackend};
/// # use bridge_server::llm::{ChatClient, LlmConfig};
/// # use std::sync::Arc;
/// # let client = ChatClient::new(reqwest::Client::new(), LlmConfig::from_env().unwrap());
/// let router = BridgeRouter::new(Arc::new(ToolflowBackend::new(client)))
///     .with_path_prefix("/v1")
///     .into_router();
/// ```
pub struct BridgeRouter {
    backend: Arc<dyn Backend>,
    options: StreamOptions,
    path_prefix: String,
}

impl BridgeRouter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            options: StreamOptions::default(),
            path_prefix: String::new(),
        }
    }

    /// Override stream tuning (keepalive interval).
    #[must_use]
    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    /// Set a path prefix for all routes. The prefix should start with `/`
    /// and not end with `/`.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Build the Axum router with all endpoints configured.
    pub fn into_router(self) -> Router {
        let state = BridgeState::new(self.backend, self.options);
        let root_path = if self.path_prefix.is_empty() {
            "/".to_string()
        } else {
            self.path_prefix.clone()
        };
        Router::new()
            .route(&format!("{}/api/chat", self.path_prefix), post(chat_handler))
            .route(&format!("{}/health", self.path_prefix), get(health_handler))
            .route(&root_path, get(info_handler))
            .with_state(state)
    }
}

static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Main chat endpoint: runs the request and streams SSE frames.
pub async fn chat_handler(
    State(state): State<BridgeState>,
    Json(request): Json<RunRequest>,
) -> Response {
    let stream = orchestrator::run_stream(state.backend, request, state.options);
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));

    match Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header(CONNECTION, "keep-alive")
        .header(&X_ACCEL_BUFFERING, "no")
        .body(body)
    {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(%error, "failed to build SSE response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Health check endpoint.
pub async fn health_handler(State(state): State<BridgeState>) -> Response {
    Json(json!({
        "status": "healthy",
        "backend": state.backend.name(),
    }))
    .into_response()
}

/// Root endpoint with API info.
pub async fn info_handler(State(state): State<BridgeState>) -> Response {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend.name(),
        "endpoints": {
            "/api/chat": "POST - run a chat request (SSE stream)",
            "/health": "GET - health check",
        },
        "ui_actions": [
            "changeBackgroundColor",
            "changeTheme",
            "showNotification",
            "resetUI",
        ],
    }))
    .into_response()
}
