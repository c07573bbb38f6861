//! Tool-invocation protocols.
//!
//! An adapter owns everything protocol-specific about a turn: what the
//! provider is sent, how a response becomes tool requests, and how executed
//! results are written back into the conversation.

use async_trait::async_trait;
use serde_json::Value;

use agent_core::{AgentError, Message, Session, ToolCallRequest, ToolCallResult, ToolError};
use agent_llm::ChatProvider;

use crate::stream::EventEmitter;

pub mod fallback;
pub mod native;

pub use fallback::FallbackProtocolAdapter;
pub use native::NativeProtocolAdapter;

/// One provider response, reduced to what the orchestrator acts on.
#[derive(Debug, Clone, Default)]
pub struct RoundOutput {
    /// Full text of the response.
    pub content: String,
    pub requests: Vec<ToolCallRequest>,
    /// Text the adapter held back from the client. Emitted if the turn ends
    /// on this round without running its requests.
    pub pending: Option<String>,
}

impl RoundOutput {
    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutedCall {
    pub request: ToolCallRequest,
    pub outcome: Result<Value, ToolError>,
}

impl ExecutedCall {
    pub fn to_result(&self) -> ToolCallResult {
        match &self.outcome {
            Ok(payload) => ToolCallResult::success(&self.request.correlation_id, payload.clone()),
            Err(error) => ToolCallResult::failure(&self.request.correlation_id, error.to_string()),
        }
    }

    pub fn is_unknown_tool(&self) -> bool {
        matches!(self.outcome, Err(ToolError::NotFound(_)))
    }
}

/// What happens after a round of tool executions.
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// Ask the provider again with the results in context.
    Continue,
    /// End the turn, optionally with a final answer to emit.
    Finish(Option<String>),
}

#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one provider call. Content events for the round are emitted here;
    /// tool requests are returned for the orchestrator to execute.
    async fn generate(
        &mut self,
        session: &Session,
        provider: &dyn ChatProvider,
        emitter: &EventEmitter,
    ) -> Result<RoundOutput, AgentError>;

    /// Writes the round and its tool results into the conversation.
    fn continue_with(
        &mut self,
        session: &mut Session,
        round: RoundOutput,
        executed: Vec<ExecutedCall>,
    ) -> Continuation;

    /// Records the final round of the turn. Unexecuted requests are dropped.
    fn finish(&mut self, session: &mut Session, round: RoundOutput) {
        if !round.content.trim().is_empty() {
            session.add_message(Message::assistant(round.content, None));
        }
    }
}
