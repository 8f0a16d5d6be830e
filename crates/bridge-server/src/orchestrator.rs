//! Run orchestration: owns the run lifecycle around a backend.
//!
//! For each request the orchestrator validates intake, spawns the backend
//! as a background producer task, and returns a byte stream of SSE frames
//! drained from the event channel. The producer side guarantees the
//! protocol contract regardless of how the backend behaves: every run ends
//! in exactly one terminal event, all open spans closed, followed by the
//! end-of-stream sentinel.
//!
//! If the client disconnects, dropping the returned stream cancels the
//! backend task so upstream LLM calls are abandoned promptly rather than
//! running to completion unobserved.

use crate::backends::Backend;
use crate::channel::{self, EventSource, Pop, StreamItem};
use crate::emitter::RunEmitter;
use crate::encoder;
use crate::intake::{self, PreparedRun};
use bridge_core::RunRequest;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default idle period before a keepalive frame is sent.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-stream tuning knobs.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// How long the drain loop waits for the next event before emitting a
    /// keepalive comment frame.
    pub poll_timeout: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Run a request against a backend, returning the SSE frame stream.
///
/// Always returns a stream, even for invalid requests: validation errors
/// surface as a `RUN_ERROR` protocol event, not a transport failure.
pub fn run_stream(
    backend: Arc<dyn Backend>,
    request: RunRequest,
    options: StreamOptions,
) -> BoxStream<'static, Bytes> {
    let (sink, source) = channel::channel();
    let mut emitter = RunEmitter::new(sink.clone());

    let Some(prepared) = intake::prepare(&request) else {
        tracing::warn!("request rejected: no user message");
        emitter.error_run("No user message provided");
        sink.close();
        return drain(source, options.poll_timeout, None);
    };

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    tokio::spawn(async move {
        // Drop-guaranteed: the sentinel follows the terminal event even if
        // settling the run itself panics.
        let _closer = CloseOnDrop(sink);
        drive(backend, prepared, &mut emitter, cancel).await;
    });

    drain(source, options.poll_timeout, Some(guard))
}

/// Pushes the end-of-stream sentinel when dropped.
struct CloseOnDrop(channel::EventSink);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Producer task: runs the backend and settles the run.
async fn drive(
    backend: Arc<dyn Backend>,
    prepared: PreparedRun,
    emitter: &mut RunEmitter,
    cancel: CancellationToken,
) {
    emitter.start_run();
    tracing::info!(
        run_id = %emitter.run_id(),
        backend = backend.name(),
        "run started"
    );

    // Explicit UI commands in the user input take effect immediately,
    // before the backend produces anything.
    for action in &prepared.input_actions {
        emitter.emit_ui_action(action.clone());
    }

    let outcome = {
        let work = std::panic::AssertUnwindSafe(backend.process_message(
            &prepared.input,
            &prepared.history,
            emitter,
        ))
        .catch_unwind();
        tokio::pin!(work);
        tokio::select! {
            result = &mut work => Some(result),
            _ = cancel.cancelled() => None,
        }
    };

    match outcome {
        Some(Ok(Ok(_final_text))) => {
            tracing::info!(run_id = %emitter.run_id(), "run finished");
            emitter.finish_run();
        }
        Some(Ok(Err(error))) => {
            tracing::error!(run_id = %emitter.run_id(), %error, "backend failed");
            emitter.error_run(error.to_string());
        }
        Some(Err(_panic)) => {
            tracing::error!(run_id = %emitter.run_id(), "backend panicked");
            emitter.error_run("backend panicked");
        }
        None => {
            tracing::info!(run_id = %emitter.run_id(), "client disconnected, run cancelled");
        }
    }
}

struct DrainState {
    source: EventSource,
    poll_timeout: Duration,
    done: bool,
    /// Cancels the producer when the consumer stops reading.
    _cancel_on_drop: Option<DropGuard>,
}

/// Consumer side: turn channel items into SSE frames.
fn drain(
    source: EventSource,
    poll_timeout: Duration,
    cancel_on_drop: Option<DropGuard>,
) -> BoxStream<'static, Bytes> {
    let state = DrainState {
        source,
        poll_timeout,
        done: false,
        _cancel_on_drop: cancel_on_drop,
    };
    futures::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        match state.source.pop(state.poll_timeout).await {
            Pop::Item(StreamItem::Event(event)) => {
                let frame = match encoder::encode(&event) {
                    Ok(frame) => frame,
                    Err(error) => {
                        tracing::error!(%error, "event encoding failed");
                        encoder::encode_failure_frame(&error.to_string())
                    }
                };
                Some((frame, state))
            }
            Pop::Item(StreamItem::Done) => {
                state.done = true;
                Some((encoder::done_frame(), state))
            }
            Pop::TimedOut => Some((encoder::keepalive(), state)),
            // Producer gone without a sentinel; nothing more will come.
            Pop::Closed => None,
        }
    })
    .boxed()
}
