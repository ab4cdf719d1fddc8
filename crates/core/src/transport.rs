//! LlmTransport trait — the abstraction over the LLM backend.
//!
//! A transport knows how to send a two-message prompt to a model and get a
//! response back, either as one complete message or as a stream of raw
//! fragments. The analysis pipeline calls `chat()` or `stream_chat()` without
//! knowing which backend is in use.
//!
//! Implementation: Ollama `/api/chat` in `kubesentinel-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A single chat message in a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system" | "user" | "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Sampling options passed through to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            num_predict: 2000,
        }
    }
}

/// A request to the LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "gpt-oss:20b").
    pub model: String,

    /// The conversation messages — for analysis, system prompt + user prompt.
    pub messages: Vec<ChatMessage>,

    /// Whether to stream the response.
    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub options: SamplingOptions,
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The full text of the model's answer.
    pub content: String,
}

/// One fragment of a streaming response.
///
/// Fragments arrive in order and are never coalesced or reordered by the
/// transport. `done` is the explicit stream-termination signal; the final
/// chunk may carry an empty `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub done: bool,
}

/// The LLM transport trait.
///
/// Streaming hands back an `mpsc::Receiver`; dropping the receiver is the
/// cancellation signal — the implementation must stop reading and release
/// the underlying connection promptly.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    /// A human-readable name for this transport (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TransportError>;

    /// Send a request and get a stream of response fragments.
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<ChatChunk, TransportError>>, TransportError>;

    /// Liveness probe — can we reach the backend? Uses its own short
    /// timeout, independent of any in-flight analysis request.
    async fn health_check(&self) -> Result<bool, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors() {
        let msg = ChatMessage::system("You are an SRE assistant.");
        assert_eq!(msg.role, "system");
        let msg = ChatMessage::user("Analyze these logs");
        assert_eq!(msg.role, "user");
    }

    #[test]
    fn sampling_defaults() {
        let opts = SamplingOptions::default();
        assert!((opts.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(opts.num_predict, 2000);
    }

    #[test]
    fn request_serializes_for_wire() {
        let req = ChatRequest {
            model: "gpt-oss:20b".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("usr")],
            stream: true,
            options: SamplingOptions::default(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-oss:20b");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["options"]["num_predict"], 2000);
    }

    #[test]
    fn chunk_defaults_when_fields_absent() {
        let chunk: ChatChunk = serde_json::from_str("{}").unwrap();
        assert_eq!(chunk.content, "");
        assert!(!chunk.done);
    }
}
