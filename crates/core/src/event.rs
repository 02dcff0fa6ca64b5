// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run event model.
//!
//! Events are NDJSON lines in a run's `events.ndjson`. Sequence numbers are
//! 1-based and strictly increasing within a run; exactly one terminal event
//! (`run:complete` | `run:failed` | `run:cancelled`) may exist, and nothing
//! may follow it.

use crate::id::{RunId, SpawnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire schema version for event lines.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "run:start")]
    RunStart,
    #[serde(rename = "run:cancelRequested")]
    RunCancelRequested,
    #[serde(rename = "run:complete")]
    RunComplete,
    #[serde(rename = "run:failed")]
    RunFailed,
    #[serde(rename = "run:cancelled")]
    RunCancelled,
    #[serde(rename = "spawn:start")]
    SpawnStart,
    #[serde(rename = "spawn:event")]
    SpawnEvent,
    #[serde(rename = "spawn:result")]
    SpawnResult,
    #[serde(rename = "io")]
    Io,
    #[serde(rename = "milestone")]
    Milestone,
    #[serde(rename = "tool_call")]
    ToolCall,
}

impl EventKind {
    /// True for the unique final event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::RunComplete | EventKind::RunFailed | EventKind::RunCancelled)
    }
}

crate::simple_display! {
    EventKind {
        RunStart => "run:start",
        RunCancelRequested => "run:cancelRequested",
        RunComplete => "run:complete",
        RunFailed => "run:failed",
        RunCancelled => "run:cancelled",
        SpawnStart => "spawn:start",
        SpawnEvent => "spawn:event",
        SpawnResult => "spawn:result",
        Io => "io",
        Milestone => "milestone",
        ToolCall => "tool_call",
    }
}

/// One event line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub schema_version: u32,
    pub run_id: RunId,
    /// 1-based, strictly increasing within a run, assigned by the writer.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// Origin of an `io` event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoSource {
    Driver,
    Program,
}

/// Stream an `io` event line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoStream {
    Stdout,
    Stderr,
}

/// Payload of an `io` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoPayload {
    pub source: IoSource,
    pub stream: IoStream,
    pub line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_id: Option<SpawnId>,
}

/// Payload of a `spawn:event` line: one normalized driver event, spawn-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEventPayload {
    pub spawn_id: SpawnId,
    /// `{type: "milestone"|"tool_call", …}`
    pub event: Value,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
