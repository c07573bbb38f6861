use async_trait::async_trait;

use agent_core::tools::ToolSchema;
use agent_core::{AgentError, Message, Session, ToolCallRequest};
use agent_llm::ChatProvider;

use super::{Continuation, ExecutedCall, ProtocolAdapter, RoundOutput};
use crate::stream::handler::consume_llm_stream;
use crate::stream::EventEmitter;

/// Structured tool calling: schemas travel with the request, calls come back
/// as stream fragments, results go back as `tool` messages.
pub struct NativeProtocolAdapter {
    schemas: Vec<ToolSchema>,
}

impl NativeProtocolAdapter {
    pub fn new(schemas: Vec<ToolSchema>) -> Self {
        Self { schemas }
    }
}

#[async_trait]
impl ProtocolAdapter for NativeProtocolAdapter {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn generate(
        &mut self,
        session: &Session,
        provider: &dyn ChatProvider,
        emitter: &EventEmitter,
    ) -> Result<RoundOutput, AgentError> {
        let stream = provider
            .stream_chat(&session.messages, &self.schemas)
            .await
            .map_err(|error| AgentError::ProviderTransport(error.to_string()))?;

        let output =
            consume_llm_stream(stream, Some(emitter), emitter.cancel_token(), &session.id).await?;

        Ok(RoundOutput {
            content: output.content,
            requests: output
                .tool_calls
                .iter()
                .map(ToolCallRequest::from_tool_call)
                .collect(),
            pending: None,
        })
    }

    fn continue_with(
        &mut self,
        session: &mut Session,
        round: RoundOutput,
        executed: Vec<ExecutedCall>,
    ) -> Continuation {
        let tool_calls = round
            .requests
            .iter()
            .map(ToolCallRequest::to_tool_call)
            .collect();
        session.add_message(Message::assistant(round.content, Some(tool_calls)));

        for call in &executed {
            let result = call.to_result();
            session.add_message(Message::tool_result(
                result.correlation_id.clone(),
                result.to_model_text(),
            ));
        }

        Continuation::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Role, ToolArguments, ToolError};
    use serde_json::json;

    #[test]
    fn continuation_appends_assistant_then_one_tool_message_per_call() {
        let mut session = Session::with_messages("s1", vec![Message::user("Synonyms for feliz?")]);
        let mut adapter = NativeProtocolAdapter::new(Vec::new());

        let mut args = ToolArguments::new();
        args.insert("word".to_string(), json!("feliz"));
        let ok = ToolCallRequest::new("synonyms", args);
        let missing = ToolCallRequest::new("dictionary", ToolArguments::new());

        let round = RoundOutput {
            content: String::new(),
            requests: vec![ok.clone(), missing.clone()],
            pending: None,
        };
        let executed = vec![
            ExecutedCall {
                request: ok.clone(),
                outcome: Ok(json!(["contento", "alegre"])),
            },
            ExecutedCall {
                request: missing.clone(),
                outcome: Err(ToolError::NotFound("dictionary".to_string())),
            },
        ];

        let next = adapter.continue_with(&mut session, round, executed);

        assert_eq!(next, Continuation::Continue);
        assert_eq!(session.messages.len(), 4);

        let assistant = &session.messages[1];
        assert_eq!(assistant.role, Role::Assistant);
        let calls = assistant.tool_calls.as_ref().expect("tool calls recorded");
        assert_eq!(calls[0].id, ok.correlation_id);
        assert_eq!(calls[0].function.arguments, r#"{"word":"feliz"}"#);

        assert_eq!(session.messages[2].tool_call_id.as_deref(), Some(ok.correlation_id.as_str()));
        assert_eq!(session.messages[2].content, r#"["contento","alegre"]"#);
        assert_eq!(session.messages[3].content, "Error: Tool not found: dictionary");
    }
}
