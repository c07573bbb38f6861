pub mod agent;
pub mod tools;

pub use agent::events::{EventEnvelope, StreamEvent};
pub use agent::types::{Message, Role, Session};
pub use agent::AgentError;
pub use tools::{
    parse_tool_args, FnExecutor, RegistryError, ToolArguments, ToolCall, ToolCallAccumulator,
    ToolCallDelta, ToolCallRequest, ToolCallResult, ToolDefinition, ToolError, ToolExecutor,
    ToolParameter, ToolRegistry, ToolSchema,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
