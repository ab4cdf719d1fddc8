//! Streaming model-response interpreter for KubeSentinel.
//!
//! This crate is the heart of the backend: it consumes the incremental token
//! stream from the LLM, classifies each fragment into a semantic channel
//! (hidden reasoning vs. user-visible content), reassembles the full text
//! across arbitrarily fragmented network chunks, and — once the stream ends —
//! extracts a single structured remediation proposal from free-form, possibly
//! malformed, model output.
//!
//! Pipeline per request:
//!
//! ```text
//! prompt builder → LLM transport → tag classifier (per fragment)
//!                                → response aggregator (running buffer)
//!                                → on done → proposal extractor
//!                                → terminal done/error event
//! ```
//!
//! Each request owns an independent classifier and aggregator; nothing is
//! shared across concurrent requests.

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod extract;
pub mod prompt;

pub use aggregator::ResponseAggregator;
pub use analyzer::Analyzer;
pub use classifier::{Channel, ClassifiedEvent, TagClassifier};
pub use extract::extract_proposal;
