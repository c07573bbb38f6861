//! Executor that forwards tool calls to an HTTP endpoint.
//!
//! The arguments are POSTed as a JSON object. A JSON response body becomes the
//! tool result as-is; any other body is wrapped as `{"text": ...}`.

use std::collections::HashMap;
use std::time::Duration;

use agent_core::{ToolArguments, ToolExecutor};
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HttpTool {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    headers: HashMap<String, String>,
}

impl HttpTool {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            headers: HashMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ToolExecutor for HttpTool {
    async fn execute(&self, args: ToolArguments) -> anyhow::Result<Value> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&Value::Object(args));

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        log::debug!("Calling tool endpoint {}", self.endpoint);

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read tool response")?;

        if !status.is_success() {
            bail!("HTTP {}: {}", status, body.trim());
        }

        Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "text": body })))
    }
}
