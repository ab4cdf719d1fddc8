//! The analyzer — wires transport, classifier, aggregator, and extractor
//! into the two public operations: streaming and non-streaming analysis.
//!
//! Every request gets a fresh classifier and aggregator; no state survives a
//! request or is shared between concurrent ones. The stream of
//! `AnalysisEvent`s is strictly ordered: fragments are classified and
//! forwarded in arrival order, and exactly one terminal `done`/`error` event
//! closes the sequence.
//!
//! Cancellation: the streaming operation hands back an `mpsc::Receiver`.
//! When the caller drops it, the next send fails and the pipeline task
//! returns, dropping the transport stream and releasing the connection. No
//! background work continues.

use std::sync::Arc;

use kubesentinel_core::error::TransportError;
use kubesentinel_core::event::AnalysisEvent;
use kubesentinel_core::log::LogRecord;
use kubesentinel_core::proposal::Proposal;
use kubesentinel_core::transport::{ChatMessage, ChatRequest, LlmTransport, SamplingOptions};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::aggregator::ResponseAggregator;
use crate::classifier::{Channel, TagClassifier};
use crate::extract::extract_proposal;
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};

/// Maximum characters of raw model output echoed in an error event.
const PREVIEW_LEN: usize = 500;

/// Facade over the analysis pipeline.
pub struct Analyzer {
    transport: Arc<dyn LlmTransport>,
    model: String,
    options: SamplingOptions,
}

impl Analyzer {
    pub fn new(transport: Arc<dyn LlmTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            options: SamplingOptions::default(),
        }
    }

    fn request(&self, logs: &[LogRecord], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_user_prompt(logs)),
            ],
            stream,
            options: self.options.clone(),
        }
    }

    /// Non-streaming analysis: one complete model response, one extraction.
    ///
    /// All failures (transport, timeout, extraction) are logged and surfaced
    /// as `None`; nothing escapes as a panic or error value.
    pub async fn analyze(&self, logs: &[LogRecord]) -> Option<Proposal> {
        let response = match self.transport.chat(self.request(logs, false)).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "LLM analysis failed");
                return None;
            }
        };

        let proposal = extract_proposal(&response.content);
        if proposal.is_none() {
            warn!(
                preview = %preview(&response.content),
                "Model response yielded no parseable proposal"
            );
        }
        proposal
    }

    /// Streaming analysis: a finite, single-pass event sequence.
    ///
    /// Zero or more `thinking`/`content` events in fragment arrival order,
    /// then exactly one `done` or `error`.
    pub async fn analyze_stream(&self, logs: &[LogRecord]) -> mpsc::Receiver<AnalysisEvent> {
        let (tx, rx) = mpsc::channel(64);
        let transport = self.transport.clone();
        let request = self.request(logs, true);

        tokio::spawn(async move {
            run_pipeline(transport, request, tx).await;
        });

        rx
    }
}

/// Drive one streamed request through classify → aggregate → extract.
async fn run_pipeline(
    transport: Arc<dyn LlmTransport>,
    request: ChatRequest,
    tx: mpsc::Sender<AnalysisEvent>,
) {
    let mut chunks = match transport.stream_chat(request).await {
        Ok(rx) => rx,
        Err(e) => {
            let _ = tx.send(error_event(&e)).await;
            return;
        }
    };

    let mut classifier = TagClassifier::new();
    let mut aggregator = ResponseAggregator::new();

    while let Some(result) = chunks.recv().await {
        let chunk = match result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(error_event(&e)).await;
                return;
            }
        };

        // Raw text always reaches the aggregator, whatever the channel and
        // whether or not any event is emitted.
        aggregator.feed(&chunk.content);

        for classified in classifier.classify(&chunk.content) {
            let event = match classified.channel {
                Channel::Thinking => AnalysisEvent::Thinking {
                    content: classified.text,
                },
                Channel::Content => AnalysisEvent::Content {
                    content: classified.text,
                },
            };
            if tx.send(event).await.is_err() {
                return; // consumer disconnected — release the transport
            }
        }

        if chunk.done {
            aggregator.mark_complete();
            let text = aggregator.finalize();
            let terminal = match extract_proposal(&text) {
                Some(proposal) => AnalysisEvent::Done { proposal },
                None => {
                    debug!(full = %text, "Model response yielded no parseable proposal");
                    AnalysisEvent::Error {
                        message: format!(
                            "Could not parse response as JSON. Response preview: {}",
                            preview(&text)
                        ),
                    }
                }
            };
            let _ = tx.send(terminal).await;
            return;
        }
    }

    // The transport closed without ever signalling completion.
    debug!(partial = %aggregator.text(), "Transport closed before completion signal");
    let _ = tx
        .send(AnalysisEvent::Error {
            message: "Stream ended before completion signal".into(),
        })
        .await;
}

fn error_event(e: &TransportError) -> AnalysisEvent {
    AnalysisEvent::Error {
        message: e.to_string(),
    }
}

/// Truncate to the preview budget on a char boundary.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_LEN) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubesentinel_core::log::LogLevel;
    use kubesentinel_core::transport::{ChatChunk, ChatResponse};
    use std::sync::Mutex;

    /// A mock transport that replays a scripted chunk sequence.
    struct ScriptedTransport {
        chunks: Mutex<Vec<Result<ChatChunk, TransportError>>>,
        full_response: Mutex<Option<Result<ChatResponse, TransportError>>>,
    }

    impl ScriptedTransport {
        fn streaming(chunks: Vec<Result<ChatChunk, TransportError>>) -> Self {
            Self {
                chunks: Mutex::new(chunks),
                full_response: Mutex::new(None),
            }
        }

        fn complete(response: Result<ChatResponse, TransportError>) -> Self {
            Self {
                chunks: Mutex::new(Vec::new()),
                full_response: Mutex::new(Some(response)),
            }
        }

        /// Script fragments of `text` followed by a done chunk.
        fn from_fragments(fragments: &[&str]) -> Self {
            let mut chunks: Vec<Result<ChatChunk, TransportError>> = fragments
                .iter()
                .map(|f| {
                    Ok(ChatChunk {
                        content: (*f).into(),
                        done: false,
                    })
                })
                .collect();
            chunks.push(Ok(ChatChunk {
                content: String::new(),
                done: true,
            }));
            Self::streaming(chunks)
        }
    }

    #[async_trait::async_trait]
    impl LlmTransport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, TransportError> {
            self.full_response
                .lock()
                .unwrap()
                .take()
                .expect("scripted transport: no complete response set")
        }

        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<ChatChunk, TransportError>>, TransportError> {
            let chunks: Vec<_> = self.chunks.lock().unwrap().drain(..).collect();
            let (tx, rx) = mpsc::channel(8);
            tokio::spawn(async move {
                for chunk in chunks {
                    if tx.send(chunk).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }

        async fn health_check(&self) -> Result<bool, TransportError> {
            Ok(true)
        }
    }

    fn logs() -> Vec<LogRecord> {
        vec![LogRecord {
            id: "1".into(),
            timestamp: "2024-05-01T10:00:00Z".into(),
            level: LogLevel::Critical,
            pod: "payment-service-7d9cf".into(),
            message: "OOMKilled".into(),
        }]
    }

    async fn collect(mut rx: mpsc::Receiver<AnalysisEvent>) -> Vec<AnalysisEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    const PROPOSAL_JSON: &str =
        r#"{"toolName":"restart_pod","args":{"pod":"p1"},"reason":"stuck"}"#;

    #[tokio::test]
    async fn streaming_happy_path() {
        let transport = Arc::new(ScriptedTransport::from_fragments(&[
            "<think>",
            "memory pressure",
            "</think>",
            PROPOSAL_JSON,
        ]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        assert!(matches!(
            &events[0],
            AnalysisEvent::Thinking { content } if content == "memory pressure"
        ));
        assert!(matches!(
            &events[1],
            AnalysisEvent::Content { content } if content == PROPOSAL_JSON
        ));
        match events.last().unwrap() {
            AnalysisEvent::Done { proposal } => {
                assert_eq!(proposal.tool_name, "restart_pod");
                assert_eq!(proposal.reason, "stuck");
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminal_event_is_exclusive_and_last() {
        let transport = Arc::new(ScriptedTransport::from_fragments(&[
            "a", "b", "c", PROPOSAL_JSON,
        ]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        let terminal_count = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminal_count, 1);
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn extraction_failure_yields_error_with_preview() {
        let transport =
            Arc::new(ScriptedTransport::from_fragments(&["I cannot determine an action."]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        match events.last().unwrap() {
            AnalysisEvent::Error { message } => {
                assert!(message.contains("Could not parse response as JSON"));
                assert!(message.contains("I cannot determine an action."));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_mid_stream_terminates() {
        let transport = Arc::new(ScriptedTransport::streaming(vec![
            Ok(ChatChunk {
                content: "partial".into(),
                done: false,
            }),
            Err(TransportError::StreamInterrupted("connection reset".into())),
        ]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        assert!(events.iter().filter(|e| e.is_terminal()).count() == 1);
        match events.last().unwrap() {
            AnalysisEvent::Error { message } => assert!(message.contains("connection reset")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_surfaces_timeout_marker() {
        let transport = Arc::new(ScriptedTransport::streaming(vec![Err(
            TransportError::Timeout("deadline of 120s exceeded".into()),
        )]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            AnalysisEvent::Error { message } => assert!(message.contains("timed out")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn doneless_close_yields_error_never_done() {
        let transport = Arc::new(ScriptedTransport::streaming(vec![Ok(ChatChunk {
            content: PROPOSAL_JSON.into(),
            done: false,
        })]));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let events = collect(analyzer.analyze_stream(&logs()).await).await;

        assert!(!events.iter().any(|e| matches!(e, AnalysisEvent::Done { .. })));
        match events.last().unwrap() {
            AnalysisEvent::Error { message } => {
                assert!(message.contains("before completion"))
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_streaming_returns_proposal() {
        let content = format!("<think>hmm</think>\n```json\n{PROPOSAL_JSON}\n```");
        let transport = Arc::new(ScriptedTransport::complete(Ok(ChatResponse { content })));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        let proposal = analyzer.analyze(&logs()).await.unwrap();
        assert_eq!(proposal.tool_name, "restart_pod");
    }

    #[tokio::test]
    async fn non_streaming_absent_on_garbage() {
        let transport = Arc::new(ScriptedTransport::complete(Ok(ChatResponse {
            content: "no structure here".into(),
        })));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        assert!(analyzer.analyze(&logs()).await.is_none());
    }

    #[tokio::test]
    async fn non_streaming_absent_on_transport_error() {
        let transport = Arc::new(ScriptedTransport::complete(Err(TransportError::Network(
            "connection refused".into(),
        ))));
        let analyzer = Analyzer::new(transport, "gpt-oss:20b");

        assert!(analyzer.analyze(&logs()).await.is_none());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "é".repeat(600);
        let p = preview(&text);
        assert_eq!(p.chars().count(), PREVIEW_LEN);
    }
}
