// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of a single run directory.
//!
//! ```text
//! <runsRoot>/<runId>/
//!   run.json                  current Run document, atomic replace
//!   events.ndjson             append-only, one JSON object per line
//!   result.json               written once at terminal
//!   program.ts                copy of the submitted program
//!   logs/worker.log           stdout+stderr of the worker process
//!   sessions/<spawnId>.jsonl  per-spawn driver transcript
//!   artifacts/                observe.artifact output
//! ```

use mill_core::{RunId, RunPaths, SpawnId};
use std::path::{Path, PathBuf};

/// Name of the stored program copy. Kept from the original system as an
/// observable layout contract regardless of the submitted file's name.
pub const PROGRAM_FILE: &str = "program.ts";

/// Resolver for every path inside one run directory.
#[derive(Debug, Clone)]
pub struct RunLayout {
    run_dir: PathBuf,
}

impl RunLayout {
    pub fn new(runs_root: &Path, run_id: &RunId) -> Self {
        Self { run_dir: runs_root.join(run_id.as_str()) }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn run_file(&self) -> PathBuf {
        self.run_dir.join("run.json")
    }

    pub fn events_file(&self) -> PathBuf {
        self.run_dir.join("events.ndjson")
    }

    pub fn result_file(&self) -> PathBuf {
        self.run_dir.join("result.json")
    }

    pub fn program_file(&self) -> PathBuf {
        self.run_dir.join(PROGRAM_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.run_dir.join("logs")
    }

    pub fn worker_log(&self) -> PathBuf {
        self.logs_dir().join("worker.log")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.run_dir.join("sessions")
    }

    pub fn session_file(&self, spawn_id: &SpawnId) -> PathBuf {
        self.sessions_dir().join(format!("{}.jsonl", spawn_id))
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.run_dir.join("artifacts")
    }

    /// The wire-visible subset recorded in `run.json`.
    pub fn paths(&self) -> RunPaths {
        RunPaths {
            run_dir: self.run_dir.clone(),
            run_file: self.run_file(),
            events_file: self.events_file(),
            result_file: self.result_file(),
        }
    }
}
