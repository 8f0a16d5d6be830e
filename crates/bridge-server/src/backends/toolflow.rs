//! Tool-calling agent backend.
//!
//! Runs a bounded completion/tool loop: the model either requests tool
//! calls (which are executed locally and fed back) or produces a final
//! answer, which is streamed to the client in word chunks.

use super::tools::{ToolOutput, ToolRegistry};
use super::{Backend, chunk_words};
use crate::emitter::RunEmitter;
use crate::error::{BackendError, BackendResult, ToolError};
use crate::llm::{ApiMessage, ChatClient};
use async_trait::async_trait;
use bridge_core::{ChatMessage, JsonValue, MessageId, Role, ToolCallId};

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant.

CRITICAL RULES:
1. For ANY math calculation, you MUST use the calculator tool. NEVER compute math in your head - always use the tool.
2. Remember all user details (name, workplace) and recall them when asked.
3. Use UI tools (change_background_color, change_theme, show_notification, reset_ui) when asked.";

const DEFAULT_MAX_ROUNDS: usize = 8;

pub struct ToolflowBackend {
    client: ChatClient,
    registry: ToolRegistry,
    max_rounds: usize,
}

impl ToolflowBackend {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            registry: ToolRegistry::builtin(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    fn seed_messages(&self, user_input: &str, history: &[ChatMessage]) -> Vec<ApiMessage> {
        let mut messages = vec![ApiMessage::text("system", SYSTEM_PROMPT)];
        for msg in history {
            let role = match msg.role() {
                Role::System => continue, // one system prompt only
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(ApiMessage::text(role, msg.content()));
        }
        messages.push(ApiMessage::text("user", user_input));
        messages
    }

    /// Execute one model-requested tool call, narrating it on the stream
    /// and returning the text the model gets back.
    fn run_tool(
        &self,
        name: &str,
        call_id: &ToolCallId,
        args: JsonValue,
        emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        emitter.start_tool(name, call_id, Some(args.clone()));

        let result_text = match self.registry.invoke(name, &args) {
            Ok(output) => {
                if let ToolOutput::UiAction(action) = &output {
                    emitter.emit_ui_action(action.clone());
                }
                output.result_text()
            }
            Err(error @ ToolError::UnknownTool) => {
                emitter.end_tool(call_id, "Error: unknown tool");
                return Err(BackendError::Tool {
                    name: name.to_string(),
                    source: error,
                });
            }
            // Argument and execution failures go back to the model as
            // text so it can retry or answer without the tool.
            Err(error) => {
                tracing::warn!(tool = name, %error, "tool invocation failed");
                format!("Error: {error}")
            }
        };

        emitter.end_tool(call_id, &result_text);
        Ok(result_text)
    }
}

#[async_trait]
impl Backend for ToolflowBackend {
    async fn process_message(
        &self,
        user_input: &str,
        history: &[ChatMessage],
        emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        let mut messages = self.seed_messages(user_input, history);

        for round in 0..self.max_rounds {
            let reply = self.client.complete(&messages, self.registry.specs()).await?;

            let tool_calls = reply.tool_calls.clone().unwrap_or_default();
            if tool_calls.is_empty() {
                let answer = reply.content.unwrap_or_default();
                tracing::debug!(round, chars = answer.len(), "final answer received");

                let message_id = MessageId::random();
                emitter.start_message(&message_id, Role::Assistant);
                for chunk in chunk_words(&answer, 3) {
                    emitter.append_chunk(&message_id, &chunk);
                }
                emitter.end_message(&message_id);
                return Ok(answer);
            }

            tracing::debug!(round, calls = tool_calls.len(), "executing tool calls");
            messages.push(reply);
            for call in tool_calls {
                let args = parse_tool_args(&call.function.arguments);
                let call_id = ToolCallId::new(&call.id);
                let result = self.run_tool(&call.function.name, &call_id, args, emitter)?;
                messages.push(ApiMessage::tool_result(call.id, result));
            }
        }

        Err(BackendError::Exhausted {
            max_rounds: self.max_rounds,
        })
    }

    fn name(&self) -> &'static str {
        "toolflow"
    }
}

/// Arguments arrive as a JSON string; a malformed one degrades to `null`
/// so the tool can report a proper argument error itself.
fn parse_tool_args(raw: &str) -> JsonValue {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, raw, "malformed tool arguments");
            JsonValue::Null
        }
    }
}
