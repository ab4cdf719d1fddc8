//! Ollama transport implementation.
//!
//! Talks to Ollama's native `/api/chat` endpoint. Streaming responses arrive
//! as line-delimited JSON — one `{"message":{"content":...},"done":bool}`
//! object per line — terminated by a line with `done: true`.
//!
//! Supports:
//! - Chat completions (non-streaming and NDJSON streaming)
//! - Liveness probe against `/api/tags`

use async_trait::async_trait;
use futures::StreamExt;
use kubesentinel_core::error::TransportError;
use kubesentinel_core::transport::{ChatChunk, ChatRequest, ChatResponse, LlmTransport};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Timeout for the liveness probe — independent of the analysis timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// An LLM transport backed by a local Ollama server.
pub struct OllamaTransport {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaTransport {
    /// Create a new Ollama transport.
    ///
    /// `timeout` is the end-to-end deadline for one chat request, covering
    /// the entire duration of reasoning + content generation.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Map a reqwest error to our transport taxonomy.
    fn map_send_error(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Network(format!("Ollama unreachable: {e}"))
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Parse one NDJSON line into a chunk. Returns `None` for lines that are
/// empty or not valid chunk JSON — those are skipped, not fatal.
fn parse_chunk_line(line: &str) -> Option<ChatChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChunkWire>(line) {
        Ok(wire) => Some(ChatChunk {
            content: wire.message.map(|m| m.content).unwrap_or_default(),
            done: wire.done,
        }),
        Err(e) => {
            trace!(line = %line, error = %e, "Skipping unparseable stream line");
            None
        }
    }
}

#[async_trait]
impl LlmTransport for OllamaTransport {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TransportError> {
        let mut request = request;
        request.stream = false;

        debug!(model = %request.model, "Sending chat request");

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Ollama returned error");
            return Err(TransportError::ApiError {
                status_code: status,
                message: body,
            });
        }

        let wire: ResponseWire = response.json().await.map_err(|e| TransportError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        Ok(ChatResponse {
            content: wire.message.map(|m| m.content).unwrap_or_default(),
        })
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<ChatChunk, TransportError>>, TransportError>
    {
        let mut request = request;
        request.stream = true;

        debug!(model = %request.model, "Sending streaming chat request");

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Ollama streaming error");
            return Err(TransportError::ApiError {
                status_code: status,
                message: body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Read the NDJSON byte stream and forward parsed chunks. The task
        // ends when the sender fails (receiver dropped — cancellation),
        // when `done` arrives, or when the connection closes.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let err = if e.is_timeout() {
                            TransportError::Timeout(e.to_string())
                        } else {
                            TransportError::StreamInterrupted(e.to_string())
                        };
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines; keep any partial line buffered.
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    let Some(chunk) = parse_chunk_line(&line) else {
                        continue;
                    };

                    let done = chunk.done;
                    if tx.send(Ok(chunk)).await.is_err() {
                        return; // receiver dropped — stop reading
                    }
                    if done {
                        return;
                    }
                }
            }

            // Connection closed without a done chunk. Flush any buffered
            // final line, then let the channel close; the caller treats a
            // doneless close as an error.
            if let Some(chunk) = parse_chunk_line(&buffer) {
                let _ = tx.send(Ok(chunk)).await;
            }
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Ok(response.status().is_success())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: String,
}

/// One NDJSON line of a streaming response.
#[derive(Debug, Deserialize)]
struct ChunkWire {
    #[serde(default)]
    message: Option<MessageWire>,
    #[serde(default)]
    done: bool,
}

/// A complete non-streaming response.
#[derive(Debug, Deserialize)]
struct ResponseWire {
    #[serde(default)]
    message: Option<MessageWire>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_strips_trailing_slash() {
        let transport =
            OllamaTransport::new("http://localhost:11434/", Duration::from_secs(120)).unwrap();
        assert_eq!(transport.base_url, "http://localhost:11434");
        assert_eq!(transport.name(), "ollama");
    }

    // --- NDJSON parsing tests ---

    #[test]
    fn parse_content_chunk() {
        let chunk =
            parse_chunk_line(r#"{"message":{"content":"Hello"},"done":false}"#).unwrap();
        assert_eq!(chunk.content, "Hello");
        assert!(!chunk.done);
    }

    #[test]
    fn parse_done_chunk() {
        let chunk = parse_chunk_line(r#"{"message":{"content":""},"done":true}"#).unwrap();
        assert_eq!(chunk.content, "");
        assert!(chunk.done);
    }

    #[test]
    fn parse_chunk_without_message() {
        let chunk = parse_chunk_line(r#"{"done":true}"#).unwrap();
        assert_eq!(chunk.content, "");
        assert!(chunk.done);
    }

    #[test]
    fn malformed_line_is_skipped() {
        assert!(parse_chunk_line("not json at all").is_none());
        assert!(parse_chunk_line(r#"{"message":"#).is_none());
    }

    #[test]
    fn blank_line_is_skipped() {
        assert!(parse_chunk_line("").is_none());
        assert!(parse_chunk_line("   \r").is_none());
    }

    #[test]
    fn parse_nonstreaming_response() {
        let wire: ResponseWire =
            serde_json::from_str(r#"{"message":{"content":"full answer"},"done":true}"#).unwrap();
        assert_eq!(wire.message.unwrap().content, "full answer");
    }
}
