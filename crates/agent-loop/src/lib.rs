pub mod adapters;
pub mod config;
pub mod runner;
pub mod stream;

pub use adapters::{FallbackProtocolAdapter, NativeProtocolAdapter, ProtocolAdapter};
pub use config::{OrchestratorConfig, ToolProtocol, ToolRoundLimits};
pub use runner::{Orchestrator, TurnHandle};
