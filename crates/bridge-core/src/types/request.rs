use crate::types::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// Body of the inbound `POST` that starts a run.
///
/// `thread_id` is advisory only: run and thread identifiers on the wire are
/// generated server-side at run start, so a stale or missing client value
/// never leaks into the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(
        default,
        alias = "threadId",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,
}

impl RunRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            thread_id: None,
        }
    }

    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, ChatMessage::User { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_body() {
        let req: RunRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"Hello"}]}"#)
                .expect("should deserialize");
        assert_eq!(req.messages.len(), 1);
        assert!(req.thread_id.is_none());
    }

    #[test]
    fn accepts_camel_case_thread_id() {
        let req: RunRequest =
            serde_json::from_str(r#"{"messages":[],"threadId":"thread-1"}"#).unwrap();
        assert_eq!(req.thread_id.as_deref(), Some("thread-1"));
    }

    #[test]
    fn last_user_message_skips_trailing_assistant() {
        let req = RunRequest::new(vec![
            ChatMessage::user("first"),
            ChatMessage::user("second"),
            ChatMessage::assistant("reply"),
        ]);
        assert_eq!(req.last_user_message().unwrap().content(), "second");
    }

    #[test]
    fn last_user_message_none_for_empty() {
        let req = RunRequest::new(vec![ChatMessage::system("sys only")]);
        assert!(req.last_user_message().is_none());
    }
}
