use std::collections::BTreeMap;

use uuid::Uuid;

use crate::tools::{FunctionCall, ToolCall, ToolCallDelta};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Merges streamed tool-call fragments into complete calls.
///
/// Fragments are grouped by their stream index; ids and names arrive once,
/// argument text arrives in pieces and is concatenated in order.
#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    parts: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, delta: ToolCallDelta) {
        let part = self.parts.entry(delta.index).or_default();

        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            part.id = id;
        }
        if let Some(name) = delta.name.filter(|name| !name.is_empty()) {
            part.name = name;
        }
        if let Some(arguments) = delta.arguments {
            part.arguments.push_str(&arguments);
        }
    }

    pub fn extend<I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = ToolCallDelta>,
    {
        for delta in deltas {
            self.update(delta);
        }
    }

    /// Completed calls in stream order. Fragments that never received a
    /// name are dropped.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.parts
            .into_values()
            .filter(|part| !part.name.is_empty())
            .map(|part| ToolCall {
                id: if part.id.is_empty() {
                    format!("call_{}", Uuid::new_v4())
                } else {
                    part.id
                },
                tool_type: "function".to_string(),
                function: FunctionCall {
                    name: part.name,
                    arguments: if part.arguments.trim().is_empty() {
                        "{}".to_string()
                    } else {
                        part.arguments
                    },
                },
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
