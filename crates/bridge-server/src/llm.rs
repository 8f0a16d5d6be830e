//! OpenAI-compatible chat completion client.
//!
//! Talks to Groq's `/chat/completions` endpoint (or any API speaking the
//! same dialect). The HTTP client is injected at construction so connection
//! pooling is owned by the process, not hidden in a global.

use crate::error::{BackendError, BackendResult};
use bridge_core::JsonValue;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Connection settings for the chat API.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    /// Read config from `GROQ_API_KEY` (required), `GROQ_MODEL` and
    /// `GROQ_BASE_URL` (optional).
    pub fn from_env() -> BackendResult<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| BackendError::Config("GROQ_API_KEY environment variable is required".into()))?;
        Ok(Self {
            api_key,
            model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

/// Message in the chat API dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ApiMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Tool result message, attributed to a prior call.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// Tool call requested by the model. Arguments arrive as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool declaration advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: JsonValue,
}

impl ToolSpec {
    pub fn function(name: &'static str, description: &'static str, parameters: JsonValue) -> Self {
        Self {
            kind: "function",
            function: FunctionSpec {
                name,
                description,
                parameters,
            },
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client over an injected `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Non-streaming completion, optionally advertising tools.
    pub async fn complete(
        &self,
        messages: &[ApiMessage],
        tools: &[ToolSpec],
    ) -> BackendResult<ApiMessage> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: 0.3,
            max_tokens: Some(500),
            tools: (!tools.is_empty()).then_some(tools),
            stream: false,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: CompletionResponse = response.json().await?;
        if parsed.choices.is_empty() {
            return Err(BackendError::MalformedResponse {
                reason: "completion response contained no choices".into(),
            });
        }
        Ok(parsed.choices.remove(0).message)
    }

    /// Streaming completion. Invokes `on_delta` for every content delta and
    /// returns the concatenated full text.
    pub async fn stream(
        &self,
        messages: &[ApiMessage],
        mut on_delta: impl FnMut(&str) + Send,
    ) -> BackendResult<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: 0.3,
            max_tokens: Some(500),
            tools: None,
            stream: true,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut full = String::new();
        let mut buffer = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
            for line in drain_complete_lines(&mut buffer) {
                if let Some(delta) = parse_stream_line(&line) {
                    full.push_str(&delta);
                    on_delta(&delta);
                }
            }
        }
        Ok(full)
    }
}

/// Pop every complete line off the front of `buffer`.
///
/// Decoding happens per line, after reassembly, because network chunk
/// boundaries can fall in the middle of a multi-byte UTF-8 sequence; the
/// trailing partial line (and any split sequence in it) stays buffered as
/// raw bytes until the rest arrives.
fn drain_complete_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=newline).collect();
        let line = String::from_utf8_lossy(&raw);
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }
    lines
}

/// Extract the content delta from one SSE line of a streaming completion.
///
/// Non-data lines, the `[DONE]` marker, and chunks without content (role
/// announcements, finish markers) all yield `None`. Unparseable data lines
/// are skipped rather than failing the stream.
fn parse_stream_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data: ")?;
    if payload == "[DONE]" {
        return None;
    }
    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(error) => {
            tracing::debug!(%error, "skipping unparseable stream line");
            return None;
        }
    };
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
}
