//! Ordered event channel scoped to one run.
//!
//! A thin wrapper over a tokio unbounded MPSC pair. Producers enqueue
//! without ever blocking or failing; the single consumer dequeues in strict
//! FIFO order with a per-poll timeout, which is what lets the drain loop
//! inject keep-alive frames during idle stretches.
//!
//! The end-of-stream sentinel travels through the same queue as
//! [`StreamItem::Done`] but can only be pushed via the crate-private
//! [`EventSink::close`], so code that is handed an emitter (and therefore a
//! sink underneath) cannot terminate the transport on its own.

use bridge_core::Event;
use std::time::Duration;
use tokio::sync::mpsc;

/// One slot of the run's queue: a protocol event, or the terminal sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A protocol event to be framed and flushed.
    Event(Event),
    /// End of stream. Internal: never part of the public event vocabulary.
    Done,
}

/// Outcome of one [`EventSource::pop`] poll.
#[derive(Debug, PartialEq)]
pub enum Pop {
    /// The oldest unconsumed item.
    Item(StreamItem),
    /// Nothing arrived within the timeout; caller may emit a keep-alive.
    TimedOut,
    /// All sinks are gone and the queue is drained.
    Closed,
}

/// Create a channel for one run.
pub fn channel() -> (EventSink, EventSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventSource { rx })
}

/// Producer half. Cheap to clone; enqueueing never blocks.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<StreamItem>,
}

impl EventSink {
    /// Append an event to the tail of the queue.
    ///
    /// Never fails: if the consumer is gone (client disconnected) the event
    /// is dropped and logged at trace level.
    pub fn push(&self, event: Event) {
        if self.tx.send(StreamItem::Event(event)).is_err() {
            tracing::trace!("consumer gone, dropping event");
        }
    }

    /// Push the terminal sentinel. Orchestrator-only.
    pub(crate) fn close(&self) {
        if self.tx.send(StreamItem::Done).is_err() {
            tracing::trace!("consumer gone, dropping sentinel");
        }
    }
}

/// Consumer half. Exactly one per run.
pub struct EventSource {
    rx: mpsc::UnboundedReceiver<StreamItem>,
}

impl EventSource {
    /// Wait up to `timeout` for the oldest unconsumed item.
    pub async fn pop(&mut self, timeout: Duration) -> Pop {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(item)) => Pop::Item(item),
            Ok(None) => Pop::Closed,
            Err(_) => Pop::TimedOut,
        }
    }

    /// Non-blocking pop, for synchronous assertions.
    #[cfg(test)]
    pub(crate) fn try_pop(&mut self) -> Option<StreamItem> {
        self.rx.try_recv().ok()
    }
}
