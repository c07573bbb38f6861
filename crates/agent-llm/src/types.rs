use agent_core::ToolCallDelta;

/// One decoded unit of a provider response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMChunk {
    Token(String),
    ToolCalls(Vec<ToolCallDelta>),
    Done,
}
