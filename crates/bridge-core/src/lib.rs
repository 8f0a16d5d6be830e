pub mod event;
pub mod types;

pub use event::{Event, EventType};
pub use types::ids::{MessageId, RunId, ThreadId, ToolCallId};
pub use types::message::{ChatMessage, Role};
pub use types::request::RunRequest;

/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;
