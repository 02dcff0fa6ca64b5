// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec for the Claude CLI's stream-json dialect.
//!
//! Lines: `system` (session announcement), `assistant` (message deltas with
//! `tool_use` and `text` content), `result` (the single terminal line).
//! Strict dialect: a second `result` line is rejected.

use super::{
    concat_text_segments, parse_object_lines, required_str, Codec, CodecError, Decoded,
    NormalizedEvent,
};
use mill_core::{SpawnInput, SpawnResult};
use serde_json::Value;

pub struct ClaudeCodec;

impl Codec for ClaudeCodec {
    fn driver(&self) -> &'static str {
        "claude"
    }

    fn decode(&self, input: &SpawnInput, lines: &[String]) -> Result<Decoded, CodecError> {
        let mut events = Vec::new();
        let mut session_ref: Option<String> = None;
        let mut text = String::new();
        let mut stop_reason: Option<String> = None;
        let mut error_message: Option<String> = None;
        let mut exit_code = 0;
        let mut terminal_line: Option<usize> = None;

        for (line, map) in parse_object_lines(lines)? {
            let kind = required_str(&map, line, "type")?;
            if terminal_line.is_some() {
                // Strict dialect: nothing may follow the result line.
                return Err(if kind == "result" {
                    CodecError::DuplicateTerminal { line }
                } else {
                    CodecError::NonTerminalAfterTerminal { line }
                });
            }
            match kind {
                "system" => {
                    if let Some(id) = map.get("session_id").and_then(Value::as_str) {
                        session_ref = Some(id.to_string());
                    }
                    events.push(NormalizedEvent::milestone("session:start"));
                }
                "assistant" => {
                    let content = map.get("message").and_then(|m| m.get("content"));
                    if let Some(items) = content.and_then(Value::as_array) {
                        for item in items {
                            if item.get("type").and_then(Value::as_str) == Some("tool_use") {
                                if let Some(name) = item.get("name").and_then(Value::as_str) {
                                    events.push(NormalizedEvent::tool_call(name));
                                }
                            }
                        }
                    }
                    let message_text = concat_text_segments(content);
                    if !message_text.is_empty() {
                        text = message_text;
                    }
                }
                "result" => {
                    terminal_line = Some(line);
                    if let Some(final_text) = map.get("result").and_then(Value::as_str) {
                        text = final_text.to_string();
                    }
                    if let Some(id) = map.get("session_id").and_then(Value::as_str) {
                        session_ref = Some(id.to_string());
                    }
                    stop_reason =
                        map.get("stop_reason").and_then(Value::as_str).map(str::to_string);
                    if map.get("is_error").and_then(Value::as_bool) == Some(true) {
                        exit_code = 1;
                        error_message = Some(text.clone());
                    }
                }
                // Unknown line types before the terminal are tolerated.
                _ => {}
            }
        }

        if terminal_line.is_none() {
            return Err(CodecError::MissingTerminal);
        }

        Ok(Decoded {
            events,
            result: SpawnResult {
                text,
                session_ref,
                agent: input.agent.clone(),
                model: input.model.clone(),
                driver: self.driver().to_string(),
                exit_code,
                stop_reason,
                error_message,
            },
            raw: lines.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
