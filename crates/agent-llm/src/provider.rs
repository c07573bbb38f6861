use crate::types::LLMChunk;
use agent_core::{tools::ToolSchema, Message};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMChunk>> + Send>>;

/// A streaming chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Stream a chat completion
    ///
    /// # Arguments
    /// * `messages` - Full conversation, system prompt first
    /// * `tools` - Tool schemas offered to the model; empty when tools are
    ///   described in the prompt instead
    async fn stream_chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LLMStream>;

    /// Whether the configured model accepts structured tool schemas.
    fn supports_native_tools(&self) -> bool;

    fn model(&self) -> &str;

    /// List available models
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
