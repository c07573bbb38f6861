//! Shared helpers for provider implementations.

pub mod ndjson;
pub mod openai_compat;
pub mod sse;
