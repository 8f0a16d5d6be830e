//! Event-streaming bridge between chat clients and agent backends.
//!
//! The bridge accepts a conversation over HTTP, hands the latest user
//! message to a [`Backend`](backends::Backend) adapter, and republishes the
//! backend's activity as a typed Server-Sent Events stream: run lifecycle,
//! streamed message text, tool-call spans, UI actions, and state updates.
//!
//! # Architecture
//!
//! ```text
//! POST /api/chat
//!       │
//!       ▼
//! orchestrator ──spawn──▶ backend ──▶ RunEmitter ──▶ channel
//!       │                                               │
//!       └──────────── drain ◀── SSE frames ◀── encode ──┘
//! ```
//!
//! The producer and consumer sides are decoupled by an unbounded in-memory
//! channel: backends never block on a slow client, and the drain loop
//! injects keepalive comment frames whenever the producer goes quiet.
//!
//! The emitter enforces the protocol contract: every `*_START` is matched
//! by an `*_END` before the single terminal `RUN_FINISHED`/`RUN_ERROR`
//! event, force-closing spans the backend left open.

pub mod actions;
pub mod backends;
pub mod channel;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod intake;
pub mod integrations;
pub mod llm;
pub mod orchestrator;

pub use actions::UiAction;
pub use backends::Backend;
pub use emitter::RunEmitter;
pub use error::{BackendError, BackendResult, EncodeError, EncodeResult, ToolError};
pub use orchestrator::{StreamOptions, run_stream};

/// Commonly used types for building and serving backends.
pub mod prelude {
    pub use crate::actions::UiAction;
    pub use crate::backends::{Backend, CrewBackend, ToolflowBackend};
    pub use crate::emitter::RunEmitter;
    pub use crate::error::{BackendError, BackendResult};
    pub use crate::llm::{ChatClient, LlmConfig};
    pub use crate::orchestrator::{StreamOptions, run_stream};
    pub use async_trait::async_trait;
    pub use bridge_core::{ChatMessage, Event, MessageId, Role, RunRequest, ToolCallId};
}
