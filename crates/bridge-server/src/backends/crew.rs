//! Two-stage research/writer backend.
//!
//! Models a small agent crew: a research stage gathers findings with a
//! non-streaming completion, then a writer stage streams the user-facing
//! answer. Each stage is narrated as a tool-call span so clients can show
//! which agent is working.

use super::Backend;
use crate::emitter::RunEmitter;
use crate::error::BackendResult;
use crate::llm::{ApiMessage, ChatClient};
use async_trait::async_trait;
use bridge_core::{ChatMessage, MessageId, Role, ToolCallId};
use serde_json::json;

const RESEARCH_PROMPT: &str = "You are an expert research analyst. Gather key facts, insights, \
and relevant information about the user's query. Be thorough but concise.";

const WRITER_PROMPT: &str = "You are a skilled content writer. Based on the research provided, \
create a clear and engaging response that addresses the user's query. Explain concepts simply.";

pub struct CrewBackend {
    client: ChatClient,
}

impl CrewBackend {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for CrewBackend {
    async fn process_message(
        &self,
        user_input: &str,
        _history: &[ChatMessage],
        emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        // Stage 1: research, shown as a tool-call span.
        let research_id = ToolCallId::random();
        emitter.start_tool("Research Agent", &research_id, Some(json!({"query": user_input})));

        let research = self
            .client
            .complete(
                &[
                    ApiMessage::text("system", RESEARCH_PROMPT),
                    ApiMessage::text("user", user_input),
                ],
                &[],
            )
            .await;
        let research = match research {
            Ok(reply) => reply.content.unwrap_or_default(),
            // The span is closed by the caller's force-close on error.
            Err(error) => return Err(error),
        };
        emitter.end_tool(&research_id, "Research complete");
        tracing::debug!(chars = research.len(), "research stage finished");

        // Stage 2: writer, streamed to the client token by token.
        let writer_id = ToolCallId::random();
        emitter.start_tool("Writer Agent", &writer_id, None);

        let message_id = MessageId::random();
        emitter.start_message(&message_id, Role::Assistant);

        let answer = self
            .client
            .stream(
                &[
                    ApiMessage::text("system", WRITER_PROMPT),
                    ApiMessage::text("user", format!("Research findings:\n{research}\n\nUser query: {user_input}")),
                ],
                |delta| emitter.append_chunk(&message_id, delta),
            )
            .await?;

        emitter.end_message(&message_id);
        emitter.end_tool(&writer_id, "Complete");

        Ok(answer)
    }

    fn name(&self) -> &'static str {
        "crew"
    }
}
