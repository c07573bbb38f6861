pub mod accumulator;
pub mod executor;
pub mod registry;
pub mod types;

pub use accumulator::{PartialToolCall, ToolCallAccumulator};
pub use executor::{FnExecutor, ToolError, ToolExecutor};
pub use registry::{RegistryError, ToolRegistry};
pub use types::{
    parse_tool_args, FunctionCall, FunctionSchema, ToolArguments, ToolCall, ToolCallDelta,
    ToolCallRequest, ToolCallResult, ToolDefinition, ToolParameter, ToolSchema,
};
