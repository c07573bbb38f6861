//! LLM Providers
//!
//! OpenAI-compatible SSE endpoints and Ollama's NDJSON chat endpoint.

pub(crate) mod common;
pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAICompatibleProvider;
