//! OpenAI-compatible request serialization and stream chunk parsing.
//!
//! The request body is built without leaking internal `agent_core::Message`
//! fields (like `id` / `created_at`).

use agent_core::{agent::Role, tools::ToolSchema, Message, ToolCallDelta};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::Result;
use crate::types::LLMChunk;

pub(crate) fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// Convert internal [`Message`] values to an OpenAI-compatible JSON array.
pub fn messages_to_openai_compat_json(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let mut msg = json!({
                "role": role_name(m.role),
                "content": m.content,
            });

            if let Some(tool_call_id) = &m.tool_call_id {
                msg["tool_call_id"] = json!(tool_call_id);
            }

            if let Some(tool_calls) = m.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                msg["tool_calls"] = json!(tool_calls);
            }

            msg
        })
        .collect()
}

/// Build a streaming chat request body. `tools` is omitted when empty, since
/// several compatible servers reject an empty array.
pub fn build_openai_compat_body(model: &str, messages: &[Message], tools: &[ToolSchema]) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages_to_openai_compat_json(messages),
        "stream": true,
    });

    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    body
}

// --- Streaming chunk parsing ---

#[derive(Debug, Deserialize)]
pub struct OpenAICompatStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAICompatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatChoice {
    #[serde(default)]
    delta: OpenAICompatDelta,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAICompatDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAICompatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<OpenAICompatFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Convert a single stream chunk into [`LLMChunk`]s; empty when the chunk
/// carries nothing the orchestrator consumes. Text in the same delta as tool
/// call fragments comes first.
pub fn parse_openai_compat_chunk(chunk: OpenAICompatStreamChunk) -> Vec<LLMChunk> {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if let Some(content) = choice.delta.content.filter(|content| !content.is_empty()) {
        out.push(LLMChunk::Token(content));
    }

    if let Some(tool_calls) = choice.delta.tool_calls.filter(|calls| !calls.is_empty()) {
        let deltas = tool_calls
            .into_iter()
            .map(|tc| {
                let (name, arguments) = tc
                    .function
                    .map(|f| (f.name, f.arguments))
                    .unwrap_or_default();
                ToolCallDelta {
                    index: tc.index,
                    id: tc.id,
                    name,
                    arguments,
                }
            })
            .collect();
        out.push(LLMChunk::ToolCalls(deltas));
    }

    out
}

/// Parse an SSE `data:` payload.
///
/// - `"[DONE]"` -> `LLMChunk::Done`
/// - Invalid JSON -> error
pub fn parse_openai_compat_sse_data(data: &str) -> Result<Vec<LLMChunk>> {
    if data.trim() == "[DONE]" {
        return Ok(vec![LLMChunk::Done]);
    }

    let chunk: OpenAICompatStreamChunk = serde_json::from_str(data)?;
    Ok(parse_openai_compat_chunk(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tools::{FunctionCall, ToolCall, ToolDefinition, ToolParameter};

    #[test]
    fn messages_omit_internal_fields() {
        let out = messages_to_openai_compat_json(&[Message::user("Hola")]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["role"], "user");
        assert_eq!(out[0]["content"], "Hola");
        assert!(out[0].get("id").is_none());
        assert!(out[0].get("created_at").is_none());
    }

    #[test]
    fn messages_include_tool_fields() {
        let tool_call = ToolCall {
            id: "call_1".to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: "synonyms".to_string(),
                arguments: r#"{"word":"feliz"}"#.to_string(),
            },
        };

        let out = messages_to_openai_compat_json(&[
            Message::assistant("", Some(vec![tool_call])),
            Message::tool_result("call_1", r#"["contento","alegre"]"#),
        ]);

        assert_eq!(out[0]["role"], "assistant");
        assert_eq!(out[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(out[0]["tool_calls"][0]["type"], "function");
        assert_eq!(
            out[0]["tool_calls"][0]["function"]["arguments"],
            r#"{"word":"feliz"}"#
        );
        assert_eq!(out[1]["role"], "tool");
        assert_eq!(out[1]["tool_call_id"], "call_1");
        assert!(out[1].get("tool_calls").is_none());
    }

    #[test]
    fn body_omits_empty_tools() {
        let body = build_openai_compat_body("llama3", &[Message::user("Hola")], &[]);

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], true);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn body_serializes_tool_schemas() {
        let schema = ToolDefinition::new("synonyms", "Find synonyms")
            .with_parameter(ToolParameter::required("word", "string", "Word"))
            .to_schema();

        let body = build_openai_compat_body("gpt-4o-mini", &[Message::user("Hola")], &[schema]);

        assert_eq!(body["tools"][0]["type"], "function");
        assert!(body["tools"][0].get("schema_type").is_none());
        assert_eq!(body["tools"][0]["function"]["name"], "synonyms");
        assert_eq!(body["tools"][0]["function"]["parameters"]["required"][0], "word");
    }

    #[test]
    fn content_delta_yields_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[{"delta":{"content":"Hola"},"finish_reason":null}]}"#;

        assert_eq!(
            parse_openai_compat_sse_data(data).unwrap(),
            vec![LLMChunk::Token("Hola".to_string())]
        );
    }

    #[test]
    fn tool_call_fragment_yields_delta() {
        let data = r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"function":{"arguments":"\"feliz\"}"}}]}}]}"#;

        match parse_openai_compat_sse_data(data).unwrap().as_slice() {
            [LLMChunk::ToolCalls(deltas)] => {
                assert_eq!(deltas.len(), 1);
                assert_eq!(deltas[0].index, 1);
                assert_eq!(deltas[0].id, None);
                assert_eq!(deltas[0].name, None);
                assert_eq!(deltas[0].arguments.as_deref(), Some("\"feliz\"}"));
            }
            other => panic!("expected LLMChunk::ToolCalls, got {other:?}"),
        }
    }

    #[test]
    fn empty_deltas_and_choices_are_skipped() {
        assert!(parse_openai_compat_sse_data(r#"{"choices":[{"delta":{}}]}"#)
            .unwrap()
            .is_empty());
        assert!(parse_openai_compat_sse_data(r#"{"choices":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn text_alongside_tool_calls_is_kept() {
        let data = r#"{"choices":[{"delta":{"content":"Let me check.","tool_calls":[{"index":0,"id":"call_1","function":{"name":"synonyms","arguments":""}}]}}]}"#;

        let chunks = parse_openai_compat_sse_data(data).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], LLMChunk::Token("Let me check.".to_string()));
        match &chunks[1] {
            LLMChunk::ToolCalls(deltas) => {
                assert_eq!(deltas[0].id.as_deref(), Some("call_1"));
                assert_eq!(deltas[0].name.as_deref(), Some("synonyms"));
            }
            other => panic!("expected LLMChunk::ToolCalls, got {other:?}"),
        }
    }

    #[test]
    fn done_marker_and_invalid_json() {
        assert_eq!(
            parse_openai_compat_sse_data(" [DONE] ").unwrap(),
            vec![LLMChunk::Done]
        );
        assert!(parse_openai_compat_sse_data("{invalid json}").is_err());
    }
}
