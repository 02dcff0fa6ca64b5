// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec for the PI agent dialect.
//!
//! Lines: `session`, `agent_start`, `auto_retry_start`,
//! `tool_execution_start`, and the terminals `message_end` / `agent_end`.
//! Retry-tolerant dialect: a later terminal replaces an earlier one, but any
//! non-terminal line after a terminal is still rejected.

use super::{
    concat_text_segments, parse_object_lines, required_str, Codec, CodecError, Decoded,
    NormalizedEvent,
};
use mill_core::{SpawnInput, SpawnResult};
use serde_json::Value;

pub struct PiCodec;

/// Session transcripts live at `<runDirectory>/sessions/<spawnId>.jsonl` by
/// convention; the session line's own id is only a fallback when the spawn
/// has no run directory.
fn session_ref_for(input: &SpawnInput, raw_id: &str) -> String {
    match &input.run_directory {
        Some(dir) => {
            dir.join("sessions").join(format!("{}.jsonl", input.spawn_id)).display().to_string()
        }
        None => raw_id.to_string(),
    }
}

impl Codec for PiCodec {
    fn driver(&self) -> &'static str {
        "pi"
    }

    fn decode(&self, input: &SpawnInput, lines: &[String]) -> Result<Decoded, CodecError> {
        let mut events = Vec::new();
        let mut session_ref: Option<String> = None;
        let mut text = String::new();
        let mut stop_reason: Option<String> = None;
        let mut error_message: Option<String> = None;
        let mut saw_terminal = false;

        for (line, map) in parse_object_lines(lines)? {
            let kind = required_str(&map, line, "type")?;
            let is_terminal = matches!(kind, "message_end" | "agent_end");
            if saw_terminal && !is_terminal {
                return Err(CodecError::NonTerminalAfterTerminal { line });
            }
            match kind {
                "session" => {
                    let id = required_str(&map, line, "id")?;
                    session_ref = Some(session_ref_for(input, id));
                    events.push(NormalizedEvent::milestone("session:start"));
                }
                "agent_start" => events.push(NormalizedEvent::milestone("agent:start")),
                "auto_retry_start" => events.push(NormalizedEvent::milestone("agent:retry")),
                "tool_execution_start" => {
                    let tool = required_str(&map, line, "toolName")?;
                    events.push(NormalizedEvent::tool_call(tool));
                }
                "message_end" => {
                    saw_terminal = true;
                    text = concat_text_segments(
                        map.get("message").and_then(|m| m.get("content")),
                    );
                    stop_reason =
                        map.get("stopReason").and_then(Value::as_str).map(str::to_string);
                    error_message =
                        map.get("errorMessage").and_then(Value::as_str).map(str::to_string);
                }
                "agent_end" => {
                    saw_terminal = true;
                    let last_message = map
                        .get("messages")
                        .and_then(Value::as_array)
                        .and_then(|messages| messages.last());
                    text = concat_text_segments(last_message.and_then(|m| m.get("content")));
                    stop_reason =
                        map.get("stopReason").and_then(Value::as_str).map(str::to_string);
                    error_message =
                        map.get("errorMessage").and_then(Value::as_str).map(str::to_string);
                }
                // Unknown line types before the terminal are tolerated.
                _ => {}
            }
        }

        if !saw_terminal {
            return Err(CodecError::MissingTerminal);
        }

        let exit_code = if stop_reason.as_deref() == Some("error") { 1 } else { 0 };
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
#[path = "pi_tests.rs"]
mod tests;
