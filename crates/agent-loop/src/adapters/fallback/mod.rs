//! Text-embedded tool calling for models without structured tool support.
//!
//! Tools are described in the prompt, the whole response is buffered, and the
//! first ```` ```tool_code ```` block is parsed. Unlike the native protocol,
//! nothing is streamed to the client until the response is complete.

pub mod parser;
pub mod prompt;

use async_trait::async_trait;

use agent_core::{AgentError, Message, Session, ToolCallRequest, ToolDefinition};
use agent_llm::ChatProvider;

use super::{Continuation, ExecutedCall, ProtocolAdapter, RoundOutput};
use crate::stream::handler::consume_llm_stream;
use crate::stream::EventEmitter;

pub use parser::{parse_tool_call, ParseOutcome, ParsedToolCall};
pub use prompt::build_fallback_prompt;

pub struct FallbackProtocolAdapter {
    tools: Vec<ToolDefinition>,
}

impl FallbackProtocolAdapter {
    /// `tools` are rendered in the given order.
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ProtocolAdapter for FallbackProtocolAdapter {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn generate(
        &mut self,
        session: &Session,
        provider: &dyn ChatProvider,
        emitter: &EventEmitter,
    ) -> Result<RoundOutput, AgentError> {
        let prompt = build_fallback_prompt(&self.tools, &session.messages);
        log::debug!(
            "[{}] Fallback prompt built ({} chars, {} tools)",
            session.id,
            prompt.len(),
            self.tools.len()
        );

        let stream = provider
            .stream_chat(&[Message::user(prompt)], &[])
            .await
            .map_err(|error| AgentError::ProviderTransport(error.to_string()))?;

        let output = consume_llm_stream(stream, None, emitter.cancel_token(), &session.id).await?;
        let content = output.content;

        match parse_tool_call(&content) {
            ParseOutcome::Call(call) => {
                log::debug!("[{}] Parsed tool call '{}'", session.id, call.name);
                if !call.preamble.is_empty() {
                    emitter.content(call.preamble.clone()).await?;
                }

                // Shown only if the round cap stops the call from running. With
                // nothing around the fence, the raw response is all there is.
                let pending = if !call.trailing.is_empty() {
                    Some(call.trailing)
                } else if call.preamble.is_empty() {
                    Some(content.clone())
                } else {
                    None
                };

                Ok(RoundOutput {
                    content,
                    requests: vec![ToolCallRequest::new(call.name, call.arguments)],
                    pending,
                })
            }
            outcome => {
                if let ParseOutcome::Malformed(reason) = outcome {
                    log::warn!(
                        "[{}] Ignoring malformed tool_code block ({}); using the text as the answer",
                        session.id,
                        reason
                    );
                }
                if !content.is_empty() {
                    emitter.content(content.clone()).await?;
                }
                Ok(RoundOutput {
                    content,
                    requests: Vec::new(),
                    pending: None,
                })
            }
        }
    }

    fn continue_with(
        &mut self,
        session: &mut Session,
        round: RoundOutput,
        executed: Vec<ExecutedCall>,
    ) -> Continuation {
        if let Some(unknown) = executed.iter().find(|call| call.is_unknown_tool()) {
            let answer = format!("Tool {} is not available.", unknown.request.tool);
            session.add_message(Message::assistant(answer.clone(), None));
            return Continuation::Finish(Some(answer));
        }

        session.add_message(Message::assistant(round.content, None));
        for call in &executed {
            let result = call.to_result();
            session.add_message(Message::tool_result(
                result.correlation_id.clone(),
                prompt::tool_output_block(&result.to_model_text()),
            ));
        }

        Continuation::Continue
    }
}
