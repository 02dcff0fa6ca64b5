// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec for the Codex thread/item dialect.
//!
//! Lines: `thread.started`, `item.completed` (command executions and agent
//! messages), and the strict terminal `turn.completed`.

use super::{parse_object_lines, required_str, Codec, CodecError, Decoded, NormalizedEvent};
use mill_core::{SpawnInput, SpawnResult};
use serde_json::Value;

pub struct CodexCodec;

impl Codec for CodexCodec {
    fn driver(&self) -> &'static str {
        "codex"
    }

    fn decode(&self, input: &SpawnInput, lines: &[String]) -> Result<Decoded, CodecError> {
        let mut events = Vec::new();
        let mut session_ref: Option<String> = None;
        let mut text = String::new();
        let mut saw_terminal = false;

        for (line, map) in parse_object_lines(lines)? {
            let kind = required_str(&map, line, "type")?;
            if saw_terminal {
                return Err(if kind == "turn.completed" {
                    CodecError::DuplicateTerminal { line }
                } else {
                    CodecError::NonTerminalAfterTerminal { line }
                });
            }
            match kind {
                "thread.started" => {
                    let id = required_str(&map, line, "thread_id")?;
                    session_ref = Some(id.to_string());
                    events.push(NormalizedEvent::milestone("session:start"));
                }
                "item.completed" => {
                    let Some(item) = map.get("item") else {
                        return Err(CodecError::MissingField { line, field: "item" });
                    };
                    match item.get("type").and_then(Value::as_str) {
                        Some("command_execution") => {
                            if let Some(command) = item.get("command").and_then(Value::as_str) {
                                events.push(NormalizedEvent::tool_call(command));
                            }
                        }
                        Some("agent_message") => {
                            if let Some(message) = item.get("text").and_then(Value::as_str) {
                                text = message.to_string();
                            }
                        }
                        _ => {}
                    }
                }
                "turn.completed" => saw_terminal = true,
                // Unknown line types before the terminal are tolerated.
                _ => {}
            }
        }

        if !saw_terminal {
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
                exit_code: 0,
                stop_reason: None,
                error_message: None,
            },
            raw: lines.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "codex_tests.rs"]
mod tests;
