use std::future::Future;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;
use thiserror::Error;

use super::executor::{FnExecutor, ToolError, ToolExecutor};
use super::types::{ToolArguments, ToolDefinition, ToolSchema};

pub type SharedExecutor = Arc<dyn ToolExecutor>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool with name '{0}' already registered")]
    DuplicateTool(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

#[derive(Clone)]
struct RegisteredTool {
    definition: Arc<ToolDefinition>,
    executor: SharedExecutor,
}

/// Tool definitions and their executors.
///
/// Populated at startup and shared read-mostly between concurrent turns.
pub struct ToolRegistry {
    tools: DashMap<String, RegisteredTool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register<E>(&self, definition: ToolDefinition, executor: E) -> Result<(), RegistryError>
    where
        E: ToolExecutor + 'static,
    {
        self.register_shared(definition, Arc::new(executor))
    }

    pub fn register_fn<F, Fut>(
        &self,
        definition: ToolDefinition,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.register(definition, FnExecutor::new(func))
    }

    pub fn register_shared(
        &self,
        mut definition: ToolDefinition,
        executor: SharedExecutor,
    ) -> Result<(), RegistryError> {
        let name = definition.name.trim().to_string();

        if name.is_empty() {
            return Err(RegistryError::InvalidTool(
                "tool name cannot be empty".to_string(),
            ));
        }
        definition.name = name.clone();

        match self.tools.entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateTool(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(RegisteredTool {
                    definition: Arc::new(definition),
                    executor,
                });
                Ok(())
            }
        }
    }

    pub fn definition(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools
            .get(name)
            .map(|entry| Arc::clone(&entry.value().definition))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .iter()
            .map(|entry| entry.value().definition.as_ref().clone())
            .collect();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.definitions()
            .iter()
            .map(ToolDefinition::to_schema)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Checks that every required parameter is present. Unknown parameters are ignored.
    pub fn validate(&self, name: &str, args: &ToolArguments) -> Result<(), ToolError> {
        let definition = self
            .definition(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        check_required(&definition, args)
    }

    /// Validates, fills declared defaults, and runs the tool.
    pub async fn execute(&self, name: &str, mut args: ToolArguments) -> Result<Value, ToolError> {
        // Clone out of the map so no shard lock is held across the await.
        let tool = self
            .tools
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        check_required(&tool.definition, &args)?;
        apply_defaults(&tool.definition, &mut args);

        log::debug!("Executing tool '{}' with {} argument(s)", name, args.len());

        tool.executor
            .execute(args)
            .await
            .map_err(|error| ToolError::Execution {
                tool: name.to_string(),
                message: error.to_string(),
            })
    }
}

fn check_required(definition: &ToolDefinition, args: &ToolArguments) -> Result<(), ToolError> {
    let missing = definition.missing_required(args);
    if missing.is_empty() {
        return Ok(());
    }

    Err(ToolError::Validation {
        tool: definition.name.clone(),
        missing: missing.into_iter().map(str::to_string).collect(),
    })
}

fn apply_defaults(definition: &ToolDefinition, args: &mut ToolArguments) {
    for param in &definition.parameters {
        if let Some(default) = &param.default {
            if args.get(&param.name).map_or(true, Value::is_null) {
                args.insert(param.name.clone(), default.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::tools::ToolParameter;

    fn translate_definition() -> ToolDefinition {
        ToolDefinition::new("translate", "Translate text")
            .with_parameter(ToolParameter::required("text", "string", "Source text"))
            .with_parameter(ToolParameter::required("target", "string", "Target language"))
            .with_parameter(
                ToolParameter::optional("formality", "string", "Register")
                    .with_default(json!("neutral")),
            )
    }

    fn echo_registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry
            .register_fn(translate_definition(), |args| async move {
                Ok(Value::Object(args))
            })
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_tool_registration() {
        let registry = echo_registry();

        let duplicate =
            registry.register_fn(translate_definition(), |_| async { Ok(json!(null)) });

        assert!(matches!(duplicate, Err(RegistryError::DuplicateTool(name)) if name == "translate"));
    }

    #[test]
    fn register_rejects_empty_tool_name() {
        let registry = ToolRegistry::new();

        let result = registry.register_fn(ToolDefinition::new("  ", "nameless"), |_| async {
            Ok(json!(null))
        });

        assert!(
            matches!(result, Err(RegistryError::InvalidTool(reason)) if reason == "tool name cannot be empty")
        );
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let registry = echo_registry();
        registry
            .register_fn(ToolDefinition::new("synonyms", "Find synonyms"), |_| async {
                Ok(json!([]))
            })
            .unwrap();
        registry
            .register_fn(ToolDefinition::new("conjugate", "Conjugate verbs"), |_| async {
                Ok(json!([]))
            })
            .unwrap();

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["conjugate", "synonyms", "translate"]);
        assert_eq!(registry.schemas()[2].function.name, "translate");
    }

    #[test]
    fn validate_lists_each_missing_parameter() {
        let registry = echo_registry();
        let mut args = ToolArguments::new();
        args.insert("unknown".to_string(), json!(true));

        let error = registry.validate("translate", &args).unwrap_err();
        assert_eq!(
            error,
            ToolError::Validation {
                tool: "translate".to_string(),
                missing: vec!["text".to_string(), "target".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn execute_unknown_tool_is_not_found() {
        let registry = echo_registry();
        let error = registry
            .execute("dictionary", ToolArguments::new())
            .await
            .unwrap_err();
        assert_eq!(error, ToolError::NotFound("dictionary".to_string()));
    }

    #[tokio::test]
    async fn execute_fills_defaults_and_keeps_unknown_parameters() {
        let registry = echo_registry();
        let mut args = ToolArguments::new();
        args.insert("text".to_string(), json!("bon dia"));
        args.insert("target".to_string(), json!("en"));
        args.insert("extra".to_string(), json!(1));

        let value = registry.execute("translate", args).await.unwrap();
        assert_eq!(value["formality"], "neutral");
        assert_eq!(value["extra"], 1);
    }

    #[tokio::test]
    async fn execute_does_not_run_invalid_calls() {
        let registry = ToolRegistry::new();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        registry
            .register_fn(translate_definition(), move |_| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok(json!(null))
                }
            })
            .unwrap();

        let error = registry
            .execute("translate", ToolArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ToolError::Validation { .. }));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn execute_wraps_executor_failures() {
        let registry = ToolRegistry::new();
        registry
            .register_fn(ToolDefinition::new("spell_check", "Spelling"), |_| async {
                Err(anyhow::anyhow!("network timeout"))
            })
            .unwrap();

        let error = registry
            .execute("spell_check", ToolArguments::new())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ToolError::Execution {
                tool: "spell_check".to_string(),
                message: "network timeout".to_string(),
            }
        );
    }
}
