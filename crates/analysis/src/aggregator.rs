//! Response aggregator — the running full-text buffer.
//!
//! Purely additive: every raw fragment is appended in arrival order,
//! independent of which channel the classifier routed it to. Completion is
//! signalled by the transport's explicit `done` flag, never inferred from
//! fragment content. If the transport ends without that signal the
//! accumulated text is still retrievable, but the request terminates with an
//! error event, never a done.

/// Accumulates the raw text of one streamed response.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    buffer: String,
    completed: bool,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw fragment. No transformation, no deduplication.
    pub fn feed(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    /// Record the transport's completion signal.
    pub fn mark_complete(&mut self) {
        self.completed = true;
    }

    /// Whether the transport signalled completion.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The text accumulated so far, complete or not.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Consume the aggregator and return the full concatenation.
    pub fn finalize(self) -> String {
        self.buffer
    }
}
