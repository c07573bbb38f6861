use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use agent_core::tools::{ToolCall, ToolCallAccumulator};
use agent_core::AgentError;
use agent_llm::{LLMChunk, LLMStream};

use super::emitter::EventEmitter;

pub struct StreamHandlingOutput {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Drains one provider response.
///
/// With `live` set, text deltas are forwarded as `content` events the moment
/// they arrive; otherwise the text is only buffered. Transport failures are
/// returned, never emitted, so the caller owns the terminal event.
pub async fn consume_llm_stream(
    mut stream: LLMStream,
    live: Option<&EventEmitter>,
    cancel_token: &CancellationToken,
    session_id: &str,
) -> Result<StreamHandlingOutput, AgentError> {
    let mut content = String::new();
    let mut tool_calls = ToolCallAccumulator::new();

    loop {
        let chunk_result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(AgentError::Cancelled),
            next = stream.next() => match next {
                Some(chunk_result) => chunk_result,
                None => break,
            },
        };

        match chunk_result {
            Ok(LLMChunk::Token(token)) => {
                if token.is_empty() {
                    continue;
                }
                content.push_str(&token);

                if let Some(emitter) = live {
                    emitter.content(token).await?;
                }
            }
            Ok(LLMChunk::ToolCalls(deltas)) => {
                log::debug!(
                    "[{}] Received {} tool call fragments",
                    session_id,
                    deltas.len()
                );
                tool_calls.extend(deltas);
            }
            Ok(LLMChunk::Done) => {
                log::debug!("[{}] LLM stream completed", session_id);
                break;
            }
            Err(error) => {
                log::error!("[{}] LLM stream failed: {}", session_id, error);
                return Err(AgentError::ProviderTransport(error.to_string()));
            }
        }
    }

    Ok(StreamHandlingOutput {
        content,
        tool_calls: tool_calls.finalize(),
    })
}
