//! Provider Factory
//!
//! Creates chat providers from configuration and resolves whether the
//! configured model gets structured tool schemas or prompt-described tools.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::provider::{ChatProvider, LLMError};
use crate::providers::{OllamaProvider, OpenAICompatibleProvider};

/// Available provider types
pub const AVAILABLE_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama"];

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    OpenRouter,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(LLMError::Config(format!(
                "Unknown provider: {}. Available providers: {}",
                other,
                AVAILABLE_PROVIDERS.join(", ")
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    /// Falls back to the provider's public endpoint when unset.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Forces native (`true`) or prompt-described (`false`) tool calling.
    pub native_tools: Option<bool>,
    /// Models known to accept tool schemas; consulted when `native_tools` is unset.
    pub native_tool_models: Vec<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            base_url: None,
            api_key: None,
            native_tools: None,
            native_tool_models: Vec::new(),
        }
    }

    /// Explicit override first, then membership in `native_tool_models` when
    /// that list is non-empty; otherwise the model is assumed capable.
    pub fn resolve_native_tools(&self) -> bool {
        if let Some(native) = self.native_tools {
            return native;
        }

        if self.native_tool_models.is_empty() {
            return true;
        }

        self.native_tool_models
            .iter()
            .any(|model| model.trim() == self.model)
    }
}

/// Create a provider based on the given configuration
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn ChatProvider>, LLMError> {
    if config.model.trim().is_empty() {
        return Err(LLMError::Config("a model name is required".to_string()));
    }

    let native_tools = config.resolve_native_tools();
    let base_url = config
        .base_url
        .as_deref()
        .filter(|url| !url.trim().is_empty());

    log::info!(
        "Creating {} provider for model '{}' (native tool calling: {})",
        config.kind,
        config.model,
        native_tools
    );

    match config.kind {
        ProviderKind::OpenAI | ProviderKind::OpenRouter => {
            let default_url = match config.kind {
                ProviderKind::OpenRouter => OPENROUTER_BASE_URL,
                _ => OPENAI_BASE_URL,
            };

            let mut provider =
                OpenAICompatibleProvider::new(base_url.unwrap_or(default_url), &config.model)
                    .with_native_tools(native_tools);

            if let Some(api_key) = &config.api_key {
                provider = provider.with_api_key(api_key);
            }

            Ok(Arc::new(provider))
        }

        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new(&config.model).with_native_tools(native_tools);

            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }

            Ok(Arc::new(provider))
        }
    }
}
