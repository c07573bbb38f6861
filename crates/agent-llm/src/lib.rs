pub mod provider;
pub mod provider_factory;
pub mod providers;
pub mod types;

pub use provider::{ChatProvider, LLMError, LLMStream};
pub use provider_factory::{create_provider, ProviderConfig, ProviderKind};
pub use providers::{OllamaProvider, OpenAICompatibleProvider};
pub use types::LLMChunk;
