//! Backend adapters: the agent pipelines that drive a run.
//!
//! A backend receives the prepared user input plus conversation history and
//! narrates its work through the emitter. Run lifecycle events are not its
//! concern: the orchestrator opens the run before calling in and closes it
//! from the returned `Result`, so a backend can fail anywhere without
//! corrupting the stream.

use crate::emitter::RunEmitter;
use crate::error::BackendResult;
use async_trait::async_trait;
use bridge_core::ChatMessage;

pub mod crew;
pub mod toolflow;
pub mod tools;

pub use crew::CrewBackend;
pub use toolflow::ToolflowBackend;

/// An agent pipeline the bridge can run requests against.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Process one user message, emitting message/tool/UI events along the
    /// way, and return the final response text.
    async fn process_message(
        &self,
        user_input: &str,
        history: &[ChatMessage],
        emitter: &mut RunEmitter,
    ) -> BackendResult<String>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Split text into whitespace-delimited chunks of `size` words, preserving
/// a trailing space between chunks so concatenation reconstructs the text.
/// Used to simulate streaming for backends that produce whole responses.
pub(crate) fn chunk_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(size.max(1))
        .enumerate()
        .map(|(i, chunk)| {
            let mut piece = chunk.join(" ");
            if (i + 1) * size.max(1) < words.len() {
                piece.push(' ');
            }
            piece
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_words_reconstructs_text() {
        let text = "one two three four five six seven";
        let chunks = chunk_words(text, 3);
        assert_eq!(chunks, vec!["one two three ", "four five six ", "seven"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunk_words_handles_short_text() {
        assert_eq!(chunk_words("hi", 3), vec!["hi"]);
        assert!(chunk_words("", 3).is_empty());
        assert!(chunk_words("   ", 3).is_empty());
    }
}
