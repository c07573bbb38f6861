//! Narrow parser for text-embedded tool invocations.
//!
//! Grammar: the first ```` ```tool_code ```` fence holds a single call
//! `name(key=value, ...)`. Values are never evaluated; they are unquoted and
//! coerced to a number when they look like one.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Number, Value};

use agent_core::ToolArguments;

const OPEN_FENCE: &str = "```tool_code";
const CLOSE_FENCE: &str = "```";

lazy_static! {
    static ref CALL_PATTERN: Regex =
        Regex::new(r"(?s)(\w+)\((.*?)\)").expect("tool call pattern is valid");
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCall {
    pub name: String,
    pub arguments: ToolArguments,
    /// Model text before the fence, trimmed.
    pub preamble: String,
    /// Model text after the closing fence, trimmed.
    pub trailing: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// No fence: the whole text is the answer.
    NoCall,
    Call(ParsedToolCall),
    /// A fence was present but did not hold a call.
    Malformed(String),
}

pub fn parse_tool_call(text: &str) -> ParseOutcome {
    let Some(start) = text.find(OPEN_FENCE) else {
        return ParseOutcome::NoCall;
    };

    let after_fence = &text[start + OPEN_FENCE.len()..];
    let Some(end) = after_fence.find(CLOSE_FENCE) else {
        return ParseOutcome::Malformed("unterminated tool_code block".to_string());
    };

    let code = after_fence[..end].trim();
    let Some(captures) = CALL_PATTERN.captures(code) else {
        return ParseOutcome::Malformed(format!("no function call in tool_code block: {code:?}"));
    };

    let name = captures[1].to_string();
    let arguments = parse_arguments(&captures[2]);

    ParseOutcome::Call(ParsedToolCall {
        name,
        arguments,
        preamble: text[..start].trim().to_string(),
        trailing: after_fence[end + CLOSE_FENCE.len()..].trim().to_string(),
    })
}

/// Splits on commas, then each pair on its first `=`. Pairs without `=` are
/// skipped; a later duplicate key wins.
fn parse_arguments(raw: &str) -> ToolArguments {
    let mut arguments = ToolArguments::new();

    if raw.trim().is_empty() {
        return arguments;
    }

    for pair in raw.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        arguments.insert(key.to_string(), coerce_value(value));
    }

    arguments
}

/// `.` plus a valid float -> float; all ASCII digits -> integer; otherwise the
/// unquoted string.
pub fn coerce_value(value: &str) -> Value {
    if value.contains('.') {
        if let Some(number) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    } else if !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit()) {
        if let Ok(integer) = value.parse::<u64>() {
            return Value::Number(integer.into());
        }
    }

    Value::String(value.to_string())
}
