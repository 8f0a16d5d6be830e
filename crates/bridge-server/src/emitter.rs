//! Stateful façade that turns run transitions into well-formed event
//! sequences.
//!
//! The emitter is the only handle a backend adapter gets. It owns the
//! open-span bookkeeping (which message ids and tool-call ids are currently
//! open) and guarantees that by the time a terminal event is queued, every
//! open span has been closed, synthesizing the close if the producer never
//! sent one, so the consumer's view of protocol state is never corrupted by
//! a mid-stream failure.
//!
//! Anomalies (double start, end of an unknown id, calls after a terminal
//! state) are logged and absorbed rather than surfaced: the producing side
//! of a run has nowhere useful to send an error once the stream is live.

use crate::actions::{self, UiAction};
use crate::channel::EventSink;
use bridge_core::event::{
    BaseEvent, Event, RunErrorEvent, RunFinishedEvent, RunStartedEvent, StateUpdateEvent,
    TextMessageContentEvent, TextMessageEndEvent, TextMessageStartEvent, ToolCallArgsEvent,
    ToolCallEndEvent, ToolCallResultEvent, ToolCallStartEvent, UiActionEvent,
};
use bridge_core::{JsonValue, MessageId, Role, RunId, ThreadId, ToolCallId};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event emitter scoped to one run.
pub struct RunEmitter {
    sink: EventSink,
    run_id: RunId,
    thread_id: ThreadId,
    open_messages: HashSet<MessageId>,
    open_tools: HashSet<ToolCallId>,
    /// All assistant text of the run, fed to the fallback scanner at finish.
    accumulated: String,
    /// Actions already sent, so the fallback scan never duplicates one.
    emitted_actions: HashSet<UiAction>,
    started: bool,
    terminal: bool,
    last_timestamp: f64,
}

impl RunEmitter {
    /// Create an emitter for a fresh run. Ids are generated here, never
    /// taken from the caller.
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            run_id: RunId::random(),
            thread_id: ThreadId::random(),
            open_messages: HashSet::new(),
            open_tools: HashSet::new(),
            accumulated: String::new(),
            emitted_actions: HashSet::new(),
            started: false,
            terminal: false,
            last_timestamp: 0.0,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Timestamps are wall-clock but clamped to be non-decreasing within
    /// the run.
    fn next_base(&mut self) -> BaseEvent {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(self.last_timestamp);
        let timestamp = now.max(self.last_timestamp);
        self.last_timestamp = timestamp;
        BaseEvent { timestamp }
    }

    /// Begin the run. Must be called exactly once, before anything else.
    pub fn start_run(&mut self) {
        if self.started || self.terminal {
            tracing::warn!(run_id = %self.run_id, "start_run called on an already-started run");
            return;
        }
        self.started = true;
        self.accumulated.clear();
        let event = Event::RunStarted(RunStartedEvent {
            base: self.next_base(),
            run_id: self.run_id.clone(),
            thread_id: self.thread_id.clone(),
        });
        self.sink.push(event);
    }

    /// Finish the run normally.
    ///
    /// Force-closes any spans still open, then gives the fallback scanner a
    /// pass over the accumulated text (emitting actions the run has not
    /// already sent), then queues `RUN_FINISHED`. A second terminal call is
    /// a logged no-op.
    pub fn finish_run(&mut self) {
        if self.terminal {
            tracing::warn!(run_id = %self.run_id, "finish_run after terminal state, ignoring");
            return;
        }
        self.force_close_open_spans();

        for action in actions::scan(&self.accumulated) {
            if !self.emitted_actions.contains(&action) {
                self.emit_ui_action(action);
            }
        }

        let event = Event::RunFinished(RunFinishedEvent {
            base: self.next_base(),
            run_id: self.run_id.clone(),
            thread_id: self.thread_id.clone(),
        });
        self.sink.push(event);
        self.terminal = true;
    }

    /// Fail the run. Force-closes open spans, queues `RUN_ERROR`, never
    /// `RUN_FINISHED`. A second terminal call is a logged no-op.
    pub fn error_run(&mut self, message: impl Into<String>) {
        if self.terminal {
            tracing::warn!(run_id = %self.run_id, "error_run after terminal state, ignoring");
            return;
        }
        self.force_close_open_spans();
        let event = Event::RunError(RunErrorEvent {
            base: self.next_base(),
            run_id: self.run_id.clone(),
            message: message.into(),
        });
        self.sink.push(event);
        self.terminal = true;
    }

    /// True once a terminal event has been queued.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Open a text message span. Reopening an already-open id is rejected.
    pub fn start_message(&mut self, id: &MessageId, role: Role) {
        if self.terminal {
            tracing::warn!(run_id = %self.run_id, message_id = %id, "start_message after terminal state");
            return;
        }
        if !self.open_messages.insert(id.clone()) {
            tracing::warn!(message_id = %id, "duplicate TEXT_MESSAGE_START rejected");
            return;
        }
        let event = Event::TextMessageStart(TextMessageStartEvent {
            base: self.next_base(),
            message_id: id.clone(),
            role,
        });
        self.sink.push(event);
    }

    /// Stream a text delta for a message.
    ///
    /// A chunk for an id that was never opened implicitly opens it; model
    /// output is never silently dropped.
    pub fn append_chunk(&mut self, id: &MessageId, text: &str) {
        if self.terminal {
            tracing::warn!(message_id = %id, "append_chunk after terminal state");
            return;
        }
        if !self.open_messages.contains(id) {
            tracing::warn!(message_id = %id, "chunk for unopened message, opening implicitly");
            self.start_message(id, Role::Assistant);
        }
        self.accumulated.push_str(text);
        let event = Event::TextMessageContent(TextMessageContentEvent {
            base: self.next_base(),
            message_id: id.clone(),
            delta: text.to_string(),
        });
        self.sink.push(event);
    }

    /// Close a text message span. Closing an unopened id is a no-op.
    pub fn end_message(&mut self, id: &MessageId) {
        if self.terminal {
            return;
        }
        if !self.open_messages.remove(id) {
            tracing::warn!(message_id = %id, "TEXT_MESSAGE_END for unopened message, ignoring");
            return;
        }
        let event = Event::TextMessageEnd(TextMessageEndEvent {
            base: self.next_base(),
            message_id: id.clone(),
        });
        self.sink.push(event);
    }

    /// Open a tool-call span. Non-empty args are echoed as a single
    /// `TOOL_CALL_ARGS` delta blob right after the start event; `null` and
    /// `{}` (what no-arg tools receive) produce neither field nor event.
    pub fn start_tool(&mut self, name: &str, call_id: &ToolCallId, args: Option<JsonValue>) {
        if self.terminal {
            tracing::warn!(tool_call_id = %call_id, "start_tool after terminal state");
            return;
        }
        if !self.open_tools.insert(call_id.clone()) {
            tracing::warn!(tool_call_id = %call_id, "duplicate TOOL_CALL_START rejected");
            return;
        }
        let args = args.filter(|a| match a {
            JsonValue::Null => false,
            JsonValue::Object(map) => !map.is_empty(),
            _ => true,
        });
        let delta = args.as_ref().map(|a| a.to_string());

        let event = Event::ToolCallStart(ToolCallStartEvent {
            base: self.next_base(),
            tool_call_id: call_id.clone(),
            tool_name: name.to_string(),
            args,
        });
        self.sink.push(event);

        if let Some(delta) = delta {
            let event = Event::ToolCallArgs(ToolCallArgsEvent {
                base: self.next_base(),
                tool_call_id: call_id.clone(),
                delta,
            });
            self.sink.push(event);
        }
    }

    /// Close a tool-call span and report its result. Closing an untracked
    /// id is a no-op.
    pub fn end_tool(&mut self, call_id: &ToolCallId, result: &str) {
        if self.terminal {
            return;
        }
        if !self.open_tools.remove(call_id) {
            tracing::warn!(tool_call_id = %call_id, "TOOL_CALL_END for untracked call, ignoring");
            return;
        }
        let event = Event::ToolCallEnd(ToolCallEndEvent {
            base: self.next_base(),
            tool_call_id: call_id.clone(),
        });
        self.sink.push(event);

        let event = Event::ToolCallResult(ToolCallResultEvent {
            base: self.next_base(),
            tool_call_id: call_id.clone(),
            result: result.to_string(),
        });
        self.sink.push(event);
    }

    /// Fire-and-forget UI action. Unpaired; replaying one is harmless.
    pub fn emit_ui_action(&mut self, action: UiAction) {
        if self.terminal {
            tracing::warn!(action = action.name(), "emit_ui_action after terminal state");
            return;
        }
        tracing::debug!(action = action.name(), "emitting UI action");
        let event = Event::UiAction(UiActionEvent {
            base: self.next_base(),
            action: action.name().to_string(),
            args: action.args(),
        });
        self.emitted_actions.insert(action);
        self.sink.push(event);
    }

    /// Push an opaque shared-state snapshot.
    pub fn emit_state_update(&mut self, state: JsonValue) {
        if self.terminal {
            return;
        }
        let event = Event::StateUpdate(StateUpdateEvent {
            base: self.next_base(),
            state,
        });
        self.sink.push(event);
    }

    /// Synthesize end events for every span still open, so a terminal event
    /// is never preceded by a dangling start.
    fn force_close_open_spans(&mut self) {
        for call_id in std::mem::take(&mut self.open_tools) {
            tracing::warn!(tool_call_id = %call_id, "force-closing open tool call");
            let event = Event::ToolCallEnd(ToolCallEndEvent {
                base: self.next_base(),
                tool_call_id: call_id,
            });
            self.sink.push(event);
        }
        for message_id in std::mem::take(&mut self.open_messages) {
            tracing::warn!(message_id = %message_id, "force-closing open message");
            let event = Event::TextMessageEnd(TextMessageEndEvent {
                base: self.next_base(),
                message_id,
            });
            self.sink.push(event);
        }
    }
}
