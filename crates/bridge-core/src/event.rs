use crate::JsonValue;
use crate::types::ids::{MessageId, RunId, ThreadId, ToolCallId};
use crate::types::message::Role;
use serde::{Deserialize, Serialize};

/// Event types for the bridge protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RunStarted,
    RunFinished,
    RunError,
    TextMessageStart,
    TextMessageContent,
    TextMessageEnd,
    ToolCallStart,
    ToolCallArgs,
    ToolCallEnd,
    ToolCallResult,
    UiAction,
    StateUpdate,
}

/// Base event fields common to all events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// Capture time in Unix seconds, assigned at emission. Within one run
    /// timestamps are monotonically non-decreasing; coincident events may
    /// share a value.
    pub timestamp: f64,
}

/// Run started event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "runId")]
    pub run_id: RunId,
    #[serde(rename = "threadId")]
    pub thread_id: ThreadId,
}

/// Run finished event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFinishedEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "runId")]
    pub run_id: RunId,
    #[serde(rename = "threadId")]
    pub thread_id: ThreadId,
}

/// Run error event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunErrorEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "runId")]
    pub run_id: RunId,
    pub message: String,
}

/// Text message start event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessageStartEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "messageId")]
    pub message_id: MessageId,
    pub role: Role,
}

/// Text message content event with delta text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessageContentEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "messageId")]
    pub message_id: MessageId,
    pub delta: String,
}

/// Text message end event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessageEndEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "messageId")]
    pub message_id: MessageId,
}

/// Tool call start event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallStartEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: ToolCallId,
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<JsonValue>,
}

/// Tool call arguments event; args serialized as a single delta blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallArgsEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: ToolCallId,
    pub delta: String,
}

/// Tool call end event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallEndEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: ToolCallId,
}

/// Tool call result event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResultEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: ToolCallId,
    pub result: String,
}

/// UI action event instructing the frontend to execute a named action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiActionEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    pub action: String,
    pub args: JsonValue,
}

/// Opaque shared-state snapshot event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdateEvent {
    #[serde(flatten)]
    pub base: BaseEvent,
    pub state: JsonValue,
}

/// Union of all possible events.
///
/// This is the complete public vocabulary: the end-of-stream sentinel is
/// deliberately not a variant here, so producers holding an emitter can
/// never terminate the transport themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    RunStarted(RunStartedEvent),
    RunFinished(RunFinishedEvent),
    RunError(RunErrorEvent),
    TextMessageStart(TextMessageStartEvent),
    TextMessageContent(TextMessageContentEvent),
    TextMessageEnd(TextMessageEndEvent),
    ToolCallStart(ToolCallStartEvent),
    ToolCallArgs(ToolCallArgsEvent),
    ToolCallEnd(ToolCallEndEvent),
    ToolCallResult(ToolCallResultEvent),
    UiAction(UiActionEvent),
    StateUpdate(StateUpdateEvent),
}

impl Event {
    /// Get the event type
    pub fn event_type(&self) -> EventType {
        match self {
            Event::RunStarted(_) => EventType::RunStarted,
            Event::RunFinished(_) => EventType::RunFinished,
            Event::RunError(_) => EventType::RunError,
            Event::TextMessageStart(_) => EventType::TextMessageStart,
            Event::TextMessageContent(_) => EventType::TextMessageContent,
            Event::TextMessageEnd(_) => EventType::TextMessageEnd,
            Event::ToolCallStart(_) => EventType::ToolCallStart,
            Event::ToolCallArgs(_) => EventType::ToolCallArgs,
            Event::ToolCallEnd(_) => EventType::ToolCallEnd,
            Event::ToolCallResult(_) => EventType::ToolCallResult,
            Event::UiAction(_) => EventType::UiAction,
            Event::StateUpdate(_) => EventType::StateUpdate,
        }
    }

    /// Get the emission timestamp
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::RunStarted(e) => e.base.timestamp,
            Event::RunFinished(e) => e.base.timestamp,
            Event::RunError(e) => e.base.timestamp,
            Event::TextMessageStart(e) => e.base.timestamp,
            Event::TextMessageContent(e) => e.base.timestamp,
            Event::TextMessageEnd(e) => e.base.timestamp,
            Event::ToolCallStart(e) => e.base.timestamp,
            Event::ToolCallArgs(e) => e.base.timestamp,
            Event::ToolCallEnd(e) => e.base.timestamp,
            Event::ToolCallResult(e) => e.base.timestamp,
            Event::UiAction(e) => e.base.timestamp,
            Event::StateUpdate(e) => e.base.timestamp,
        }
    }

    /// True for the terminal protocol events (`RUN_FINISHED` / `RUN_ERROR`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunFinished(_) | Event::RunError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> BaseEvent {
        BaseEvent { timestamp: 1700000000.5 }
    }

    #[test]
    fn run_started_wire_shape() {
        let event = Event::RunStarted(RunStartedEvent {
            base: base(),
            run_id: RunId::new("run-1a2b3c4d"),
            thread_id: ThreadId::new("thread-5e6f7a8b"),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "RUN_STARTED");
        assert_eq!(value["runId"], "run-1a2b3c4d");
        assert_eq!(value["threadId"], "thread-5e6f7a8b");
        assert_eq!(value["timestamp"], 1700000000.5);
    }

    #[test]
    fn text_message_content_wire_shape() {
        let event = Event::TextMessageContent(TextMessageContentEvent {
            base: base(),
            message_id: MessageId::new("msg-1"),
            delta: "Hi".into(),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "TEXT_MESSAGE_CONTENT");
        assert_eq!(value["messageId"], "msg-1");
        assert_eq!(value["delta"], "Hi");
    }

    #[test]
    fn tool_call_start_omits_null_args() {
        let event = Event::ToolCallStart(ToolCallStartEvent {
            base: base(),
            tool_call_id: ToolCallId::new("tool-1"),
            tool_name: "calculator".into(),
            args: None,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "TOOL_CALL_START");
        assert_eq!(value["toolName"], "calculator");
        assert!(value.get("args").is_none());
    }

    #[test]
    fn ui_action_wire_shape() {
        let event = Event::UiAction(UiActionEvent {
            base: base(),
            action: "changeBackgroundColor".into(),
            args: json!({"color": "blue"}),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "UI_ACTION");
        assert_eq!(value["action"], "changeBackgroundColor");
        assert_eq!(value["args"]["color"], "blue");
    }

    #[test]
    fn round_trips_through_json() {
        let event = Event::ToolCallResult(ToolCallResultEvent {
            base: base(),
            tool_call_id: ToolCallId::new("tool-9"),
            result: "Result: 4".into(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn terminal_classification() {
        let finished = Event::RunFinished(RunFinishedEvent {
            base: base(),
            run_id: RunId::new("r"),
            thread_id: ThreadId::new("t"),
        });
        let error = Event::RunError(RunErrorEvent {
            base: base(),
            run_id: RunId::new("r"),
            message: "boom".into(),
        });
        let content = Event::TextMessageEnd(TextMessageEndEvent {
            base: base(),
            message_id: MessageId::new("m"),
        });

        assert!(finished.is_terminal());
        assert!(error.is_terminal());
        assert!(!content.is_terminal());
    }
}
