//! Request intake: validation and side-channel extraction.
//!
//! Clients can smuggle structured form or file payloads inside the user
//! message using bracketed tags (`[FORM_DATA]{…}[/FORM_DATA]`,
//! `[FILE_DATA]{…}[/FILE_DATA]`). The tags are stripped before the text
//! reaches a backend and re-appended as an annotated, human-readable block
//! so the model still sees the data. Malformed payloads are dropped with a
//! warning, never failed.

use crate::actions::{self, UiAction};
use bridge_core::{ChatMessage, JsonValue, RunRequest};

/// A validated, tag-stripped request ready for a backend.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Final user message with side-channel tags replaced by annotations.
    pub input: String,
    /// Conversation history, excluding the final user message.
    pub history: Vec<ChatMessage>,
    /// UI actions found directly in the user input, emitted before the
    /// backend runs so explicit commands take effect immediately.
    pub input_actions: Vec<UiAction>,
}

/// Validate a request and prepare it for a backend run.
///
/// Returns `None` when the request carries no non-empty user message; the
/// caller reports that as a protocol error.
pub fn prepare(request: &RunRequest) -> Option<PreparedRun> {
    let (index, raw_input) = request
        .messages
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, m)| match m {
            ChatMessage::User { content } if !content.trim().is_empty() => {
                Some((i, content.clone()))
            }
            _ => None,
        })?;

    let mut input = raw_input;
    let mut annotations = Vec::new();
    for (tag, label) in [("FORM_DATA", "Form data"), ("FILE_DATA", "File data")] {
        if let Some(payload) = extract_tag(&mut input, tag) {
            annotations.push(format!("{label} (submitted by the user):\n{payload}"));
        }
    }
    let mut input = input.trim().to_string();
    for annotation in annotations {
        if !input.is_empty() {
            input.push_str("\n\n");
        }
        input.push_str(&annotation);
    }

    let history = request
        .messages
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, m)| m.clone())
        .collect();

    let input_actions = actions::scan(&input);

    Some(PreparedRun {
        input,
        history,
        input_actions,
    })
}

/// Remove the first `[TAG]…[/TAG]` block from `text`, returning its JSON
/// payload pretty-printed for annotation. A block whose payload fails to
/// parse is stripped and discarded.
fn extract_tag(text: &mut String, tag: &str) -> Option<String> {
    let open = format!("[{tag}]");
    let close = format!("[/{tag}]");
    let start = text.find(&open)?;
    let end_rel = text[start + open.len()..].find(&close)?;
    let payload_start = start + open.len();
    let payload_end = payload_start + end_rel;

    let payload = text[payload_start..payload_end].trim().to_string();
    text.replace_range(start..payload_end + close.len(), "");

    match serde_json::from_str::<JsonValue>(&payload) {
        Ok(value) => Some(
            serde_json::to_string_pretty(&value).unwrap_or(payload),
        ),
        Err(error) => {
            tracing::warn!(tag, %error, "dropping malformed side-channel payload");
            None
        }
    }
}
