//! Error types for the KubeSentinel domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all KubeSentinel operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the LLM transport layer.
///
/// `Network` covers unreachable endpoints (connect failures, DNS), `Timeout`
/// the configured end-to-end request deadline, `StreamInterrupted` a
/// connection that drops mid-stream. All of these are captured at the
/// pipeline boundary and turned into a terminal error event — they never
/// cross into the caller as a panic.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Whether this error is the configured request deadline expiring.
    ///
    /// The analyzer uses this to emit a timeout-specific terminal message
    /// instead of a generic transport failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
