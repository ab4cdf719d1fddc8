//! LLM transport implementations for KubeSentinel.
//!
//! Currently one backend: Ollama's native `/api/chat` endpoint with
//! line-delimited JSON streaming.

pub mod ollama;

pub use ollama::OllamaTransport;
