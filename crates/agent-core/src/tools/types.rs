use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::executor::ToolError;

/// Arguments passed to a tool, keyed by parameter name.
pub type ToolArguments = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ToolParameter {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Declared shape of a tool. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Names of required parameters absent (or null) in `args`, in declaration order.
    pub fn missing_required<'a>(&'a self, args: &ToolArguments) -> Vec<&'a str> {
        self.parameters
            .iter()
            .filter(|param| param.required)
            .filter(|param| args.get(&param.name).map_or(true, Value::is_null))
            .map(|param| param.name.as_str())
            .collect()
    }

    /// JSON-schema form sent to providers with native tool calling.
    pub fn to_schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut property = json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            properties.insert(param.name.clone(), property);

            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        ToolSchema {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Provider-native tool-call record as it travels inside assistant messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    pub function: FunctionCall,
}

fn default_tool_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object.
    pub arguments: String,
}

/// Fragment of a streamed tool call; fragments sharing an `index` belong together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool: String,
    pub arguments: ToolArguments,
    pub correlation_id: String,
}

impl ToolCallRequest {
    pub fn new(tool: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            correlation_id: format!("call_{}", Uuid::new_v4()),
        }
    }

    /// Builds a request from a native tool-call record.
    ///
    /// Unparseable arguments degrade to an empty map so that validation reports
    /// the missing parameters instead of the turn failing.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        let arguments = parse_tool_args(&call.function.arguments).unwrap_or_else(|error| {
            log::warn!(
                "Discarding arguments of tool call {} ({}): {}",
                call.id,
                call.function.name,
                error
            );
            ToolArguments::new()
        });

        Self {
            tool: call.function.name.clone(),
            arguments,
            correlation_id: call.id.clone(),
        }
    }

    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self.correlation_id.clone(),
            tool_type: default_tool_type(),
            function: FunctionCall {
                name: self.tool.clone(),
                arguments: Value::Object(self.arguments.clone()).to_string(),
            },
        }
    }

    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub correlation_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn success(correlation_id: impl Into<String>, payload: Value) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(correlation_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Text handed back to the model: the stringified payload, or `Error: ...`.
    pub fn to_model_text(&self) -> String {
        match (&self.payload, &self.error) {
            (Some(Value::String(text)), _) if self.ok => text.clone(),
            (Some(payload), _) if self.ok => payload.to_string(),
            (_, Some(error)) => format!("Error: {error}"),
            _ => String::new(),
        }
    }
}

pub fn parse_tool_args(arguments: &str) -> Result<ToolArguments, ToolError> {
    let args_raw = arguments.trim();

    if args_raw.is_empty() {
        return Ok(ToolArguments::new());
    }

    match serde_json::from_str::<Value>(args_raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(error) => Err(ToolError::InvalidArguments(format!(
            "Invalid JSON arguments: {error}"
        ))),
    }
}
