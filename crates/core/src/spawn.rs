// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn request and result types.
//!
//! A spawn is transient: it lives for one `factory.spawn` call and maps to
//! exactly one driver child process.

use crate::id::{RunId, SpawnId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request for one driver subprocess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnInput {
    pub run_id: RunId,
    pub spawn_id: SpawnId,
    pub agent: String,
    pub system_prompt: String,
    pub prompt: String,
    pub model: String,
    /// Run directory; drivers with on-disk transcripts derive session paths
    /// from it (`<runDirectory>/sessions/<spawnId>.jsonl`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

/// Normalized outcome of one spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnResult {
    pub text: String,
    pub session_ref: Option<String>,
    pub agent: String,
    pub model: String,
    pub driver: String,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SpawnResult {
    pub fn is_error(&self) -> bool {
        self.exit_code != 0
    }

    /// A failed result for a spawn that produced no usable driver output.
    pub fn failed(agent: &str, model: &str, driver: &str, message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            session_ref: None,
            agent: agent.to_string(),
            model: model.to_string(),
            driver: driver.to_string(),
            exit_code: 1,
            stop_reason: None,
            error_message: Some(message.into()),
        }
    }
}

/// What the user program receives back from `factory.spawn`.
///
/// Same data as [`SpawnResult`] minus bookkeeping the program has no use for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub spawn_id: SpawnId,
    pub text: String,
    pub session_ref: Option<String>,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecutionResult {
    pub fn from_result(spawn_id: SpawnId, result: &SpawnResult) -> Self {
        Self {
            spawn_id,
            text: result.text.clone(),
            session_ref: result.session_ref.clone(),
            exit_code: result.exit_code,
            stop_reason: result.stop_reason.clone(),
            error_message: result.error_message.clone(),
        }
    }
}
