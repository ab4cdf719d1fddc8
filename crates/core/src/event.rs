//! Analysis streaming events.
//!
//! `AnalysisEvent` is the typed event sequence one analysis request produces:
//! zero or more `thinking`/`content` events followed by exactly one terminal
//! `done` or `error`. The gateway forwards these to clients over SSE; any
//! other transport framing works the same way.

use serde::{Deserialize, Serialize};

use crate::proposal::Proposal;

/// Events emitted while interpreting one streamed model response.
///
/// - `thinking` — token from inside a reasoning region (hidden deliberation)
/// - `content`  — user-visible answer token
/// - `done`     — stream complete, proposal extracted
/// - `error`    — terminal failure (transport, timeout, or extraction)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Partial reasoning text from the model.
    Thinking { content: String },

    /// Partial answer text from the model.
    Content { content: String },

    /// The stream is complete — the extracted proposal.
    Done { proposal: Proposal },

    /// A terminal error. Nothing follows this event.
    Error { message: String },
}

impl AnalysisEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Content { .. } => "content",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
