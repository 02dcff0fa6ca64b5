// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run document and status state machine.

use crate::id::RunId;
use crate::spawn::SpawnResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Driver tag used when `--driver` is omitted.
pub const DEFAULT_DRIVER: &str = "pi";
/// Executor tag used when `--executor` is omitted; the only supported value.
pub const DEFAULT_EXECUTOR: &str = "direct";

/// Lifecycle status of a run. Terminal statuses are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Failed | RunStatus::Cancelled)
    }

    /// True when `next` is a legal transition from `self`.
    ///
    /// pending → running → {complete, failed, cancelled}; pending may also be
    /// cancelled directly (cancel observed before the program starts).
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match (self, next) {
            (RunStatus::Pending, RunStatus::Running) => true,
            (RunStatus::Pending, RunStatus::Cancelled) => true,
            (RunStatus::Running, s) if s.is_terminal() => true,
            _ => false,
        }
    }
}

crate::simple_display! {
    RunStatus {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Absolute paths to a run's on-disk artifacts. All resolve inside `run_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPaths {
    pub run_dir: PathBuf,
    pub run_file: PathBuf,
    pub events_file: PathBuf,
    pub result_file: PathBuf,
}

/// The `run.json` document: current state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
    pub driver: String,
    pub executor: String,
    /// Original path the user submitted (the run dir keeps its own copy).
    pub program_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paths: RunPaths,
}

impl Run {
    /// Apply a status transition, keeping `updated_at` monotonically
    /// non-decreasing. Returns false (and leaves the run untouched) when the
    /// transition is not legal.
    pub fn transition(&mut self, next: RunStatus, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.touch(at);
        true
    }

    /// Bump `updated_at`, never moving it backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

/// The `result.json` document, written once at terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: RunId,
    pub status: RunStatus,
    pub spawns: Vec<SpawnResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
