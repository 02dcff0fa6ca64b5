// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver output codecs.
//!
//! A codec turns the line-delimited JSON a driver writes on stdout into a
//! normalized event list plus exactly one terminal [`SpawnResult`]. Every
//! codec enforces the universal rules: each non-empty line must be a JSON
//! object, exactly one terminal line must appear, and nothing but a
//! retry-replacement terminal (where the dialect allows it) may follow the
//! terminal.

pub mod claude;
pub mod codex;
pub mod pi;

use mill_core::{SpawnInput, SpawnResult};
use serde_json::Value;
use thiserror::Error;

pub use claude::ClaudeCodec;
pub use codex::CodexCodec;
pub use pi::PiCodec;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("line {line}: not valid JSON: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected a JSON object")]
    NotAnObject { line: usize },
    #[error("line {line}: missing field {field:?}")]
    MissingField { line: usize, field: &'static str },
    #[error("stream ended without a terminal line")]
    MissingTerminal,
    #[error("line {line}: duplicate terminal")]
    DuplicateTerminal { line: usize },
    #[error("line {line}: non-terminal line after terminal")]
    NonTerminalAfterTerminal { line: usize },
}

/// Driver event normalized out of a dialect-specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    Milestone { label: String },
    ToolCall { tool_name: String },
}

impl NormalizedEvent {
    pub fn milestone(label: impl Into<String>) -> Self {
        Self::Milestone { label: label.into() }
    }

    pub fn tool_call(tool_name: impl Into<String>) -> Self {
        Self::ToolCall { tool_name: tool_name.into() }
    }

    /// Wire form used inside `spawn:event` payloads.
    pub fn to_value(&self) -> Value {
        match self {
            NormalizedEvent::Milestone { label } => {
                serde_json::json!({ "type": "milestone", "label": label })
            }
            NormalizedEvent::ToolCall { tool_name } => {
                serde_json::json!({ "type": "tool_call", "toolName": tool_name })
            }
        }
    }
}

/// Decoded driver output: normalized events plus the terminal result.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub events: Vec<NormalizedEvent>,
    pub result: SpawnResult,
    pub raw: Vec<String>,
}

/// A driver-dialect decoder.
pub trait Codec: Send + Sync {
    /// Driver tag recorded in results ("claude", "pi", "codex").
    fn driver(&self) -> &'static str;

    /// Decode the full stdout of one driver process.
    fn decode(&self, input: &SpawnInput, lines: &[String]) -> Result<Decoded, CodecError>;
}

/// Parse numbered non-empty lines into JSON objects, enforcing the
/// every-line-is-an-object rule. Yields `(line_number, object)` pairs with
/// 1-based numbering over the raw input.
pub(crate) fn parse_object_lines(
    lines: &[String],
) -> Result<Vec<(usize, serde_json::Map<String, Value>)>, CodecError> {
    let mut parsed = Vec::new();
    for (idx, raw) in lines.iter().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(raw).map_err(|source| CodecError::MalformedLine { line, source })?;
        match value {
            Value::Object(map) => parsed.push((line, map)),
            _ => return Err(CodecError::NotAnObject { line }),
        }
    }
    Ok(parsed)
}

/// Fetch a required string field from a parsed line.
pub(crate) fn required_str<'a>(
    map: &'a serde_json::Map<String, Value>,
    line: usize,
    field: &'static str,
) -> Result<&'a str, CodecError> {
    map.get(field).and_then(Value::as_str).ok_or(CodecError::MissingField { line, field })
}

/// Concatenate the `text` segments of a message `content` array.
pub(crate) fn concat_text_segments(content: Option<&Value>) -> String {
    let Some(items) = content.and_then(Value::as_array) else {
        return String::new();
    };
    let mut text = String::new();
    for item in items {
        if item.get("type").and_then(Value::as_str) == Some("text") {
            if let Some(segment) = item.get("text").and_then(Value::as_str) {
                text.push_str(segment);
            }
        }
    }
    text
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
