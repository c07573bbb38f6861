//! Prompt rendering for models without structured tool calling.
//!
//! The output depends only on its inputs: identical tools and messages always
//! render byte-identical prompts.

use std::fmt::Write;

use agent_core::{Message, Role, ToolDefinition};

const INSTRUCTIONS: &str = "\
At each turn, if you decide to invoke any of the function(s), wrap the call in a ```tool_code``` block. \
The Python methods described below are imported and available; you may only use the methods defined here. \
Call at most one method per turn, using keyword arguments, for example name(param=\"value\"). \
The result of a call is given back to you wrapped in a ```tool_output``` block; use it to call more \
tools or to write a helpful, friendly answer. Never invent a ```tool_output``` block yourself.

The following Python methods are available:

";

fn python_type(json_type: &str) -> &'static str {
    match json_type {
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "array" => "list",
        "object" => "dict",
        _ => "str",
    }
}

/// Renders one tool as a Python signature with a docstring.
pub fn render_tool(tool: &ToolDefinition) -> String {
    let mut out = String::new();

    if tool.parameters.is_empty() {
        let _ = write!(
            out,
            "```python\ndef {}():\n    \"\"\"{}\"\"\"\n```\n\n",
            tool.name, tool.description
        );
        return out;
    }

    let signature = tool
        .parameters
        .iter()
        .map(|param| format!("{}: {}", param.name, python_type(&param.param_type)))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = write!(
        out,
        "```python\ndef {}({}):\n    \"\"\"{}\n",
        tool.name, signature, tool.description
    );
    for param in &tool.parameters {
        if !param.description.is_empty() {
            let _ = writeln!(out, "    {}: {}", param.name, param.description);
        }
    }
    out.push_str("    \"\"\"\n```\n\n");

    out
}

/// Transcript lines in message order. Tool messages already carry their
/// ```` ```tool_output ```` block and are copied verbatim.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();

    for message in messages {
        if message.content.is_empty() {
            continue;
        }
        match message.role {
            Role::System => {
                let _ = writeln!(out, "System: {}", message.content);
            }
            Role::User => {
                let _ = writeln!(out, "User: {}", message.content);
            }
            Role::Assistant => {
                let _ = writeln!(out, "Assistant: {}", message.content);
            }
            Role::Tool => {
                let _ = writeln!(out, "{}", message.content);
            }
        }
    }

    out
}

/// Full prompt: instructions, tools in the given order, then the transcript.
pub fn build_fallback_prompt(tools: &[ToolDefinition], messages: &[Message]) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    for tool in tools {
        prompt.push_str(&render_tool(tool));
    }
    prompt.push_str(&render_transcript(messages));
    prompt
}

pub fn tool_output_block(result: &str) -> String {
    format!("```tool_output\n{result}\n```")
}
