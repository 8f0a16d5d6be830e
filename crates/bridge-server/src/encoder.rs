//! Server-Sent Events (SSE) encoder.
//!
//! Encodes bridge events into the SSE wire format as specified by the
//! [W3C Server-Sent Events specification](https://html.spec.whatwg.org/multipage/server-sent-events.html).
//!
//! # Format
//!
//! Each event is encoded as:
//! ```text
//! data: {"type":"EVENT_TYPE",...}\n\n
//! ```
//!
//! Keepalives are SSE comment frames (`: keepalive\n\n`) which compliant
//! clients discard without delivering to the application.

use crate::error::{EncodeError, EncodeResult};
use bridge_core::event::{Event, EventType};
use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum event size (1 MB).
///
/// Events larger than this are rejected to prevent memory issues.
const MAX_EVENT_SIZE: usize = 1024 * 1024;

/// Comment frame sent when a poll for the next event times out.
const KEEPALIVE_FRAME: &[u8] = b": keepalive\n\n";

/// Encode an event to SSE format.
///
/// # Errors
///
/// Returns [`EncodeError::Json`] if JSON serialization fails.
/// Returns [`EncodeError::EventTooLarge`] if the event exceeds 1 MB.
pub fn encode(event: &Event) -> EncodeResult<Bytes> {
    let json = serde_json::to_string(event).map_err(|e| EncodeError::Json {
        event_type: event_type_str(event.event_type()),
        source: e,
    })?;

    if json.len() > MAX_EVENT_SIZE {
        return Err(EncodeError::EventTooLarge {
            size: json.len(),
            max: MAX_EVENT_SIZE,
        });
    }

    // SSE format: "data: {json}\n\n"
    let mut output = String::with_capacity(6 + json.len() + 2);

    // serde_json::to_string produces single-line output, but guard against
    // embedded newlines anyway: each line needs its own "data: " prefix.
    if json.contains('\n') {
        for line in json.lines() {
            output.push_str("data: ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
    } else {
        output.push_str("data: ");
        output.push_str(&json);
        output.push_str("\n\n");
    }

    Ok(Bytes::from(output))
}

/// Keepalive comment frame.
pub fn keepalive() -> Bytes {
    Bytes::from_static(KEEPALIVE_FRAME)
}

/// Frame for the end-of-stream sentinel.
///
/// The sentinel is not a protocol event, so it is stamped here rather than
/// by the emitter.
pub fn done_frame() -> Bytes {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Bytes::from(format!(
        "data: {{\"type\":\"DONE\",\"timestamp\":{timestamp}}}\n\n"
    ))
}

/// Last-resort frame for when encoding an event itself fails.
///
/// Hand-built so it cannot fail the same way; the message is embedded via
/// `serde_json` so quoting stays correct.
pub fn encode_failure_frame(detail: &str) -> Bytes {
    let message = serde_json::Value::String(format!("event encoding failed: {detail}"));
    Bytes::from(format!(
        "data: {{\"type\":\"RUN_ERROR\",\"message\":{message}}}\n\n"
    ))
}

fn event_type_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::RunStarted => "RUN_STARTED",
        EventType::RunFinished => "RUN_FINISHED",
        EventType::RunError => "RUN_ERROR",
        EventType::TextMessageStart => "TEXT_MESSAGE_START",
        EventType::TextMessageContent => "TEXT_MESSAGE_CONTENT",
        EventType::TextMessageEnd => "TEXT_MESSAGE_END",
        EventType::ToolCallStart => "TOOL_CALL_START",
        EventType::ToolCallArgs => "TOOL_CALL_ARGS",
        EventType::ToolCallEnd => "TOOL_CALL_END",
        EventType::ToolCallResult => "TOOL_CALL_RESULT",
        EventType::UiAction => "UI_ACTION",
        EventType::StateUpdate => "STATE_UPDATE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::event::{
        BaseEvent, RunErrorEvent, RunStartedEvent, TextMessageContentEvent, UiActionEvent,
    };
    use bridge_core::{MessageId, RunId, ThreadId};

    fn base() -> BaseEvent {
        BaseEvent { timestamp: 1700000000.5 }
    }

    #[test]
    fn encode_run_started() {
        let event = Event::RunStarted(RunStartedEvent {
            base: base(),
            run_id: RunId::new("run-456"),
            thread_id: ThreadId::new("thread-123"),
        });

        let bytes = encode(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.starts_with("data: {"));
        assert!(s.ends_with("}\n\n"));
        assert!(s.contains("\"type\":\"RUN_STARTED\""));
        assert!(s.contains("\"runId\":\"run-456\""));
        assert!(s.contains("\"threadId\":\"thread-123\""));
    }

    #[test]
    fn encode_run_error() {
        let event = Event::RunError(RunErrorEvent {
            base: base(),
            run_id: RunId::new("run-1"),
            message: "something went wrong".to_string(),
        });

        let bytes = encode(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.contains("RUN_ERROR"));
        assert!(s.contains("something went wrong"));
    }

    #[test]
    fn encode_ui_action() {
        let event = Event::UiAction(UiActionEvent {
            base: base(),
            action: "changeTheme".to_string(),
            args: serde_json::json!({"theme": "dark"}),
        });

        let bytes = encode(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.contains("\"type\":\"UI_ACTION\""));
        assert!(s.contains("\"action\":\"changeTheme\""));
        assert!(s.contains("\"theme\":\"dark\""));
    }

    #[test]
    fn encode_special_characters() {
        let event = Event::TextMessageContent(TextMessageContentEvent {
            base: base(),
            message_id: MessageId::new("msg-1"),
            delta: "Line1\nLine2\t\"Quoted\"".to_string(),
        });

        let bytes = encode(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        // JSON escapes the newline, so the frame stays single-line.
        assert!(s.contains("\\n"));
        assert!(s.ends_with("\n\n"));
        assert_eq!(s.matches("data: ").count(), 1);
    }

    #[test]
    fn encode_oversized_event_rejected() {
        let event = Event::TextMessageContent(TextMessageContentEvent {
            base: base(),
            message_id: MessageId::new("msg-1"),
            delta: "x".repeat(MAX_EVENT_SIZE + 1),
        });

        match encode(&event) {
            Err(EncodeError::EventTooLarge { size, max }) => {
                assert!(size > max);
                assert_eq!(max, MAX_EVENT_SIZE);
            }
            other => panic!("expected EventTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn sse_frame_is_parseable_json() {
        let event = Event::RunStarted(RunStartedEvent {
            base: base(),
            run_id: RunId::new("r1"),
            thread_id: ThreadId::new("t1"),
        });

        let bytes = encode(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");
        let json_str = s.trim_start_matches("data: ").trim_end();
        let _: serde_json::Value = serde_json::from_str(json_str).expect("should be valid JSON");
    }

    #[test]
    fn keepalive_is_a_comment_frame() {
        let bytes = keepalive();
        assert_eq!(&bytes[..], b": keepalive\n\n");
    }

    #[test]
    fn done_frame_shape() {
        let bytes = done_frame();
        let s = std::str::from_utf8(&bytes).unwrap();
        assert!(s.starts_with("data: {\"type\":\"DONE\""));
        assert!(s.ends_with("\n\n"));
        let json_str = s.trim_start_matches("data: ").trim_end();
        let value: serde_json::Value = serde_json::from_str(json_str).unwrap();
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn encode_failure_frame_quotes_detail() {
        let bytes = encode_failure_frame("weird \"payload\"");
        let s = std::str::from_utf8(&bytes).unwrap();
        let json_str = s.trim_start_matches("data: ").trim_end();
        let value: serde_json::Value = serde_json::from_str(json_str).unwrap();
        assert_eq!(value["type"], "RUN_ERROR");
        assert!(value["message"].as_str().unwrap().contains("weird"));
    }
}
