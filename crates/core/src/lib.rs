//! # KubeSentinel Core
//!
//! Domain types, traits, and error definitions for the KubeSentinel incident
//! analysis backend. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! The LLM transport is defined as a trait here; the Ollama implementation
//! lives in `kubesentinel-providers`. The analysis pipeline, gateway, and CLI
//! all depend inward on this crate and never on each other's internals.

pub mod error;
pub mod event;
pub mod log;
pub mod proposal;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, TransportError};
pub use event::AnalysisEvent;
pub use log::{LogLevel, LogRecord};
pub use proposal::Proposal;
pub use transport::{ChatChunk, ChatMessage, ChatRequest, ChatResponse, LlmTransport, SamplingOptions};
