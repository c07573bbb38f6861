use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::{ChatProvider, LLMError, LLMStream, Result};
use crate::types::LLMChunk;
use agent_core::{tools::ToolSchema, Message, ToolCallDelta};

use super::common::ndjson::llm_stream_from_ndjson;
use super::common::openai_compat::role_name;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama's `/api/chat` endpoint, streamed as newline-delimited JSON.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    native_tools: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatLine {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            native_tools: true,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_native_tools(mut self, native_tools: bool) -> Self {
        self.native_tools = native_tools;
        self
    }
}

/// Ollama expects tool-call arguments as JSON objects, not encoded strings.
fn messages_to_ollama_json(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let mut msg = json!({
                "role": role_name(m.role),
                "content": m.content,
            });

            if let Some(tool_calls) = m.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                let calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|call| {
                        let arguments = serde_json::from_str::<Value>(&call.function.arguments)
                            .unwrap_or_else(|_| json!({}));
                        json!({
                            "function": {
                                "name": call.function.name,
                                "arguments": arguments,
                            }
                        })
                    })
                    .collect();
                msg["tool_calls"] = Value::Array(calls);
            }

            msg
        })
        .collect()
}

fn build_ollama_body(model: &str, messages: &[Message], tools: &[ToolSchema]) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages_to_ollama_json(messages),
        "stream": true,
    });

    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    body
}

/// Decodes one NDJSON line. Each complete tool call gets its own index so the
/// accumulator never merges separate calls; `next_index` carries across lines.
fn parse_ollama_line(line: &str, next_index: &mut usize) -> Result<Option<LLMChunk>> {
    let parsed: OllamaChatLine = serde_json::from_str(line)?;

    if let Some(error) = parsed.error {
        return Err(LLMError::Api(error));
    }

    if let Some(message) = parsed.message {
        if !message.tool_calls.is_empty() {
            let deltas = message
                .tool_calls
                .into_iter()
                .map(|call| {
                    let index = *next_index;
                    *next_index += 1;
                    let arguments = match call.function.arguments {
                        Value::Null => "{}".to_string(),
                        Value::String(encoded) => encoded,
                        other => other.to_string(),
                    };
                    ToolCallDelta {
                        index,
                        id: None,
                        name: Some(call.function.name),
                        arguments: Some(arguments),
                    }
                })
                .collect();
            return Ok(Some(LLMChunk::ToolCalls(deltas)));
        }

        if !message.content.is_empty() {
            return Ok(Some(LLMChunk::Token(message.content)));
        }
    }

    if parsed.done {
        return Ok(Some(LLMChunk::Done));
    }

    Ok(None)
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn stream_chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LLMStream> {
        let body = build_ollama_body(&self.model, messages, tools);

        log::debug!(
            "POST {}/api/chat (model '{}', {} messages, {} tools)",
            self.base_url,
            self.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let mut next_index = 0;
        Ok(llm_stream_from_ndjson(response, move |line| {
            parse_ollama_line(line, &mut next_index)
        }))
    }

    fn supports_native_tools(&self) -> bool {
        self.native_tools
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let tags: OllamaTags = response.json().await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tools::{FunctionCall, ToolCall};
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn tool_call_arguments_are_sent_as_objects() {
        let call = ToolCall {
            id: "call_1".to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: "spell_check".to_string(),
                arguments: r#"{"text":"ola"}"#.to_string(),
            },
        };

        let out = messages_to_ollama_json(&[Message::assistant("", Some(vec![call]))]);

        assert_eq!(out[0]["tool_calls"][0]["function"]["name"], "spell_check");
        assert_eq!(out[0]["tool_calls"][0]["function"]["arguments"]["text"], "ola");
    }

    #[test]
    fn parse_line_assigns_increasing_indices() {
        let mut next_index = 0;
        let line = r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"a","arguments":{}}},{"function":{"name":"b","arguments":{"x":1}}}]},"done":false}"#;

        match parse_ollama_line(line, &mut next_index).unwrap() {
            Some(LLMChunk::ToolCalls(deltas)) => {
                assert_eq!(deltas[0].index, 0);
                assert_eq!(deltas[1].index, 1);
                assert_eq!(deltas[1].arguments.as_deref(), Some(r#"{"x":1}"#));
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
        assert_eq!(next_index, 2);
    }

    #[test]
    fn parse_line_error_field_is_api_error() {
        let mut next_index = 0;
        let result = parse_ollama_line(r#"{"error":"model 'x' not found"}"#, &mut next_index);
        assert!(matches!(result, Err(LLMError::Api(message)) if message.contains("not found")));
    }

    #[tokio::test]
    async fn stream_chat_decodes_ndjson() {
        let mock_server = MockServer::start().await;

        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Bon\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\" dia\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3.1", "stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = OllamaProvider::new("llama3.1").with_base_url(mock_server.uri());
        let stream = provider
            .stream_chat(&[Message::user("Hola")], &[])
            .await
            .expect("stream");
        let chunks: Vec<LLMChunk> = stream.map(|item| item.expect("chunk")).collect().await;

        assert_eq!(
            chunks,
            vec![
                LLMChunk::Token("Bon".to_string()),
                LLMChunk::Token(" dia".to_string()),
                LLMChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn list_models_reads_tags() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "llama3.1:8b"}, {"name": "mistral"}]
            })))
            .mount(&mock_server)
            .await;

        let provider = OllamaProvider::new("llama3.1").with_base_url(mock_server.uri());
        assert_eq!(
            provider.list_models().await.expect("models"),
            vec!["llama3.1:8b", "mistral"]
        );
    }
}
