use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use agent_core::ToolRegistry;
use agent_llm::{ProviderConfig, ProviderKind};
use agent_loop::{OrchestratorConfig, ToolProtocol, ToolRoundLimits};
use agent_server::logging::init_logging;
use agent_server::{run_server, AppState};

#[derive(Parser, Debug, Clone)]
#[command(name = "agent-server")]
#[command(about = "Tool-calling chat agent HTTP server")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Server port
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// LLM provider (openai, openrouter or ollama)
    #[arg(long, env = "LLM_PROVIDER", default_value = "ollama")]
    provider: String,

    /// LLM API base URL; defaults to the provider's public endpoint
    #[arg(long, env = "LLM_BASE_URL")]
    llm_base_url: Option<String>,

    /// LLM model name
    #[arg(long, env = "LLM_MODEL", default_value = "llama2")]
    model: String,

    /// LLM API key
    #[arg(long, env = "LLM_API_KEY")]
    api_key: Option<String>,

    /// Force native (true) or prompt-described (false) tool calling
    #[arg(long, env = "NATIVE_TOOLS")]
    native_tools: Option<bool>,

    /// Comma-separated models that support native tool calling
    #[arg(long, env = "NATIVE_TOOL_MODELS", value_delimiter = ',')]
    native_tool_models: Vec<String>,

    /// JSON manifest of HTTP tools to register
    #[arg(long, env = "TOOLS_CONFIG")]
    tools_config: Option<PathBuf>,

    /// Tool rounds per turn with native tool calling
    #[arg(long, env = "MAX_TOOL_ROUNDS", default_value = "3")]
    max_tool_rounds: usize,

    /// Tool rounds per turn with prompt-described tool calling
    #[arg(long, env = "FALLBACK_MAX_TOOL_ROUNDS", default_value = "1")]
    fallback_max_tool_rounds: usize,

    /// System prompt used when the client sends none
    #[arg(long, env = "SYSTEM_PROMPT")]
    system_prompt: Option<String>,
}

impl Cli {
    fn provider_config(&self) -> anyhow::Result<ProviderConfig> {
        let kind: ProviderKind = self.provider.parse()?;

        Ok(ProviderConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.api_key.clone(),
            native_tools: self.native_tools,
            native_tool_models: self
                .native_tool_models
                .iter()
                .map(|model| model.trim().to_string())
                .filter(|model| !model.is_empty())
                .collect(),
            ..ProviderConfig::new(kind, self.model.clone())
        })
    }

    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            system_prompt: self.system_prompt.clone(),
            protocol: match self.native_tools {
                Some(true) => ToolProtocol::Native,
                Some(false) => ToolProtocol::Fallback,
                None => ToolProtocol::Auto,
            },
            round_limits: ToolRoundLimits {
                native: self.max_tool_rounds,
                fallback: self.fallback_max_tool_rounds,
            },
            ..Default::default()
        }
    }

    fn tool_registry(&self) -> anyhow::Result<ToolRegistry> {
        let registry = ToolRegistry::new();

        match &self.tools_config {
            Some(path) => {
                agent_tools::load_tools_into(path, &registry)
                    .with_context(|| format!("failed to load tools from {}", path.display()))?;
            }
            None => log::warn!("TOOLS_CONFIG not set; starting without tools"),
        }

        Ok(registry)
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    log::info!("Starting agent server on port {}", cli.port);
    log::info!("LLM Configuration:");
    log::info!("  Provider: {}", cli.provider);
    log::info!(
        "  Base URL: {}",
        cli.llm_base_url.as_deref().unwrap_or("(provider default)")
    );
    log::info!("  Model: {}", cli.model);
    log::debug!("Server configuration: {:?}", cli.orchestrator_config());

    let state = AppState::from_config(
        &cli.provider_config()?,
        cli.tool_registry()?,
        cli.orchestrator_config(),
    )?;

    run_server(cli.port, state).await?;
    Ok(())
}
