//! Error types for the bridge server.
//!
//! Backend failures never cross the orchestrator boundary: they are caught
//! there and reported to the client as a single `RUN_ERROR` protocol event.
//! The types here exist so everything up to that boundary is an ordinary
//! `Result` with enough context to log.

use thiserror::Error;

/// Errors during event encoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("JSON serialization failed for {event_type}: {source}")]
    Json {
        /// The event type being serialized.
        event_type: &'static str,
        /// The underlying `serde_json` error.
        #[source]
        source: serde_json::Error,
    },

    /// Event data exceeds maximum allowed size.
    #[error("event exceeds max size: {size} bytes > {max} bytes limit")]
    EventTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Errors from backend adapters.
///
/// Everything an adapter can fail with while driving a run. The orchestrator
/// maps any of these to exactly one `error_run` call.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// Outbound HTTP request failed before a response arrived.
    #[error("chat completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat API answered with a non-success status.
    #[error("chat API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The chat API answered 2xx but the payload was not usable.
    #[error("malformed chat API response: {reason}")]
    MalformedResponse {
        /// What was wrong with the payload.
        reason: String,
    },

    /// A local tool invocation failed.
    #[error("tool '{name}' failed: {source}")]
    Tool {
        /// Tool name as advertised to the model.
        name: String,
        #[source]
        source: ToolError,
    },

    /// Required configuration is missing or invalid.
    #[error("missing configuration: {0}")]
    Config(String),

    /// The tool-calling loop did not converge.
    #[error("tool loop exceeded {max_rounds} rounds without a final answer")]
    Exhausted {
        /// Configured round limit.
        max_rounds: usize,
    },

    /// Adapter-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl BackendError {
    /// Create an adapter-specific error from a message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Errors from individual tool invocations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ToolError {
    /// The model asked for a tool the registry does not know.
    #[error("unknown tool")]
    UnknownTool,

    /// Arguments did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool ran but could not produce a result.
    #[error("{0}")]
    Failed(String),
}

/// Result type alias for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = BackendError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "chat API returned 429: rate limited");

        let err = BackendError::Tool {
            name: "calculator".into(),
            source: ToolError::InvalidArgs("missing 'expression'".into()),
        };
        assert_eq!(
            err.to_string(),
            "tool 'calculator' failed: invalid arguments: missing 'expression'"
        );

        let err = EncodeError::EventTooLarge { size: 2048, max: 1024 };
        assert_eq!(
            err.to_string(),
            "event exceeds max size: 2048 bytes > 1024 bytes limit"
        );
    }

    #[test]
    fn tool_error_source_is_preserved() {
        use std::error::Error as _;
        let err = BackendError::Tool {
            name: "get_weather".into(),
            source: ToolError::UnknownTool,
        };
        assert!(err.source().is_some());
    }
}
