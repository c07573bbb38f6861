use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::provider::{ChatProvider, LLMError, LLMStream, Result};
use agent_core::{tools::ToolSchema, Message};

use super::common::openai_compat::{build_openai_compat_body, parse_openai_compat_sse_data};
use super::common::sse::llm_stream_from_sse;

/// Any server speaking the OpenAI chat-completions streaming protocol
/// (OpenAI, OpenRouter, vLLM, LM Studio, ...).
pub struct OpenAICompatibleProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    native_tools: bool,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            native_tools: true,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    pub fn with_native_tools(mut self, native_tools: bool) -> Self {
        self.native_tools = native_tools;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.bearer_auth(api_key),
            None => request,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatibleProvider {
    async fn stream_chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LLMStream> {
        let body = build_openai_compat_body(&self.model, messages, tools);

        log::debug!(
            "POST {}/chat/completions (model '{}', {} messages, {} tools)",
            self.base_url,
            self.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .authorized(
                self.client
                    .post(format!("{}/chat/completions", self.base_url)),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(llm_stream_from_sse(response, parse_openai_compat_sse_data))
    }

    fn supports_native_tools(&self) -> bool {
        self.native_tools
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .authorized(self.client.get(format!("{}/models", self.base_url)))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let models: ModelList = response.json().await?;
        Ok(models.data.into_iter().map(|model| model.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMChunk;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builders() {
        let provider = OpenAICompatibleProvider::new("https://openrouter.ai/api/v1/", "gpt-4o")
            .with_api_key("sk-test")
            .with_native_tools(false);

        assert_eq!(provider.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(provider.model(), "gpt-4o");
        assert!(!provider.supports_native_tools());
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let provider = OpenAICompatibleProvider::new("http://localhost:1234/v1", "local")
            .with_api_key("");
        assert!(provider.api_key.is_none());
    }

    #[tokio::test]
    async fn test_stream_chat_decodes_tokens_and_tool_calls() {
        let mock_server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Let me check\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"synonyms\",\"arguments\":\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"word\\\":\\\"feliz\\\"}\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini", "stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            OpenAICompatibleProvider::new(format!("{}/v1", mock_server.uri()), "gpt-4o-mini")
                .with_api_key("sk-test");

        let stream = provider
            .stream_chat(&[Message::user("Synonyms for feliz?")], &[])
            .await
            .expect("stream");
        let chunks: Vec<LLMChunk> = stream.map(|item| item.expect("chunk")).collect().await;

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], LLMChunk::Token("Let me check".to_string()));
        match &chunks[1] {
            LLMChunk::ToolCalls(deltas) => {
                assert_eq!(deltas[0].id.as_deref(), Some("call_1"));
                assert_eq!(deltas[0].name.as_deref(), Some("synonyms"));
            }
            other => panic!("expected tool call delta, got {other:?}"),
        }
        assert_eq!(chunks[3], LLMChunk::Done);
    }

    #[tokio::test]
    async fn test_http_error_status_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let provider = OpenAICompatibleProvider::new(mock_server.uri(), "gpt-4o-mini");
        let result = provider.stream_chat(&[Message::user("Hola")], &[]).await;

        match result {
            Err(LLMError::Api(message)) => {
                assert!(message.contains("401"));
                assert!(message.contains("invalid api key"));
            }
            Err(other) => panic!("expected API error, got {other:?}"),
            Ok(_) => panic!("expected API error"),
        }
    }

    #[tokio::test]
    async fn test_list_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}]
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenAICompatibleProvider::new(mock_server.uri(), "gpt-4o");
        let models = provider.list_models().await.expect("models");
        assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);
    }
}
