use serde::{Deserialize, Serialize};

/// Which tool-invocation protocol a turn uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolProtocol {
    /// Ask the provider (`ChatProvider::supports_native_tools`).
    #[default]
    Auto,
    Native,
    Fallback,
}

/// Maximum tool-execution rounds per turn, per protocol.
///
/// Every executed round is followed by exactly one continuation request, so a
/// turn makes at most `limit + 1` provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRoundLimits {
    pub native: usize,
    pub fallback: usize,
}

impl Default for ToolRoundLimits {
    fn default() -> Self {
        Self {
            native: 3,
            fallback: 1,
        }
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Inserted as the first message when the conversation has no system message.
    pub system_prompt: Option<String>,
    pub protocol: ToolProtocol,
    pub round_limits: ToolRoundLimits,
    /// Capacity of the event channel created by `Orchestrator::spawn_turn`.
    pub event_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            protocol: ToolProtocol::Auto,
            round_limits: ToolRoundLimits::default(),
            event_buffer: 1,
        }
    }
}
