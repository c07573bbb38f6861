use std::sync::Arc;

use agent_core::ToolRegistry;
use agent_llm::{create_provider, ProviderConfig};
use agent_loop::{Orchestrator, OrchestratorConfig};

/// Shared by every request; each chat request runs its own turn.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn from_config(
        provider_config: &ProviderConfig,
        registry: ToolRegistry,
        config: OrchestratorConfig,
    ) -> anyhow::Result<Self> {
        log::info!(
            "Creating LLM provider: {} with model: {}",
            provider_config.kind,
            provider_config.model
        );
        let provider = create_provider(provider_config)?;

        log::info!(
            "Native tool calling: {}; {} tool(s) registered",
            provider.supports_native_tools(),
            registry.len()
        );

        Ok(Self::new(Orchestrator::with_config(
            provider,
            Arc::new(registry),
            config,
        )))
    }
}
