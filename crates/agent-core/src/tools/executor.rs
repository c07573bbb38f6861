use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::types::ToolArguments;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter(s) for '{tool}': {}", .missing.join(", "))]
    Validation { tool: String, missing: Vec<String> },

    /// The tool ran and failed; displays the failure detail only.
    #[error("{message}")]
    Execution { tool: String, message: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Runs a tool once its arguments have been validated.
///
/// Executors may fail with anything; the registry wraps failures into
/// [`ToolError::Execution`].
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, args: ToolArguments) -> anyhow::Result<Value>;
}

/// Adapts an async closure into a [`ToolExecutor`].
pub struct FnExecutor<F, Fut> {
    func: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnExecutor<F, Fut>
where
    F: Fn(ToolArguments) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnExecutor<F, Fut>
where
    F: Fn(ToolArguments) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn execute(&self, args: ToolArguments) -> anyhow::Result<Value> {
        (self.func)(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fn_executor_forwards_arguments() {
        let executor = FnExecutor::new(|args: ToolArguments| async move {
            Ok(json!({ "echo": args.get("word").cloned() }))
        });

        let mut args = ToolArguments::new();
        args.insert("word".to_string(), json!("casa"));

        let value = executor.execute(args).await.unwrap();
        assert_eq!(value["echo"], "casa");
    }

    #[test]
    fn validation_error_lists_every_missing_parameter() {
        let error = ToolError::Validation {
            tool: "translate".to_string(),
            missing: vec!["text".to_string(), "target".to_string()],
        };

        assert_eq!(
            error.to_string(),
            "Missing required parameter(s) for 'translate': text, target"
        );
    }

    #[test]
    fn execution_error_displays_detail_only() {
        let error = ToolError::Execution {
            tool: "spell_check".to_string(),
            message: "network timeout".to_string(),
        };
        assert_eq!(error.to_string(), "network timeout");
    }
}
