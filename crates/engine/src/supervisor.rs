// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor: the operations behind the CLI.
//!
//! The supervisor never transitions run state itself: it creates runs,
//! forks detached workers, and otherwise only reads `run.json` and the event
//! log. Its single write into a live run is the `run:cancelRequested` event.

use crate::error::EngineError;
use crate::poll;
use crate::watch::{WatchChannel, WatchEnvelope};
use mill_core::{
    Clock, Event, EventKind, Run, RunId, RunPaths, RunResult, RunStatus, SystemClock,
    DEFAULT_DRIVER, DEFAULT_EXECUTOR,
};
use mill_storage::{EventLogError, EventReader, EventWriter, RunStore};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Options for `submit`.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub driver: String,
    pub executor: String,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self { driver: DEFAULT_DRIVER.to_string(), executor: DEFAULT_EXECUTOR.to_string() }
    }
}

/// Async submit envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub run_id: RunId,
    pub status: RunStatus,
    pub paths: RunPaths,
}

/// Sync submit envelope: the terminal run plus its result document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReceipt {
    pub run: Run,
    pub result: RunResult,
}

/// `status` / `ls` envelope entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub status: RunStatus,
}

/// `cancel` envelope. `status` communicates intent; the worker owns the
/// actual transition, visible on the next read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReceipt {
    pub run_id: RunId,
    pub status: RunStatus,
    pub already_terminal: bool,
}

/// Outcome of `wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Terminal(RunStatus),
    TimedOut(RunStatus),
}

pub struct Supervisor<C: Clock = SystemClock> {
    store: RunStore,
    clock: C,
}

impl Supervisor<SystemClock> {
    pub fn new(runs_root: impl Into<PathBuf>) -> Self {
        Self::with_clock(runs_root, SystemClock)
    }
}

impl<C: Clock> Supervisor<C> {
    pub fn with_clock(runs_root: impl Into<PathBuf>, clock: C) -> Self {
        Self { store: RunStore::new(runs_root), clock }
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Create the run on disk (directory skeleton, program copy, initial
    /// `run.json`, `run:start`) without forking a worker.
    pub fn create_run(
        &self,
        program_path: &Path,
        options: &SubmitOptions,
    ) -> Result<Run, EngineError> {
        if !program_path.is_file() {
            return Err(EngineError::InvalidInput(format!(
                "program not found: {}",
                program_path.display()
            )));
        }
        if mill_adapters::resolve_driver(&options.driver).is_none() {
            return Err(EngineError::InvalidInput(format!(
                "unknown driver: {} (known: {})",
                options.driver,
                mill_adapters::KNOWN_DRIVERS.join(", ")
            )));
        }
        if options.executor != DEFAULT_EXECUTOR {
            return Err(EngineError::InvalidInput(format!(
                "unknown executor: {} (only {DEFAULT_EXECUTOR:?} is supported)",
                options.executor
            )));
        }

        let now = self.clock.now_utc();
        let run_id = RunId::generate(self.clock.unix_secs());
        let layout = self.store.layout(&run_id);
        let run = Run {
            id: run_id,
            status: RunStatus::Pending,
            driver: options.driver.clone(),
            executor: options.executor.clone(),
            program_path: program_path.to_path_buf(),
            created_at: now,
            updated_at: now,
            paths: layout.paths(),
        };
        self.store.create(&run)?;
        std::fs::copy(program_path, layout.program_file())?;

        let events = EventWriter::open(&layout.events_file(), run_id)?;
        events.append(
            EventKind::RunStart,
            serde_json::json!({ "programPath": program_path.display().to_string() }),
            now,
        )?;
        tracing::info!(run_id = %run_id, program = %program_path.display(), "run created");
        Ok(run)
    }

    /// Submit: create the run and fork a detached worker. Returns whatever
    /// status `run.json` shows right after the fork (`pending` or `running`).
    pub fn submit(
        &self,
        program_path: &Path,
        options: &SubmitOptions,
    ) -> Result<SubmitReceipt, EngineError> {
        let run = self.create_run(program_path, options)?;
        self.fork_worker(&run)?;
        let current = self.store.load(&run.id).unwrap_or(run);
        Ok(SubmitReceipt { run_id: current.id, status: current.status, paths: current.paths })
    }

    /// Submit and block until terminal.
    pub async fn submit_sync(
        &self,
        program_path: &Path,
        options: &SubmitOptions,
    ) -> Result<SyncReceipt, EngineError> {
        let receipt = self.submit(program_path, options)?;
        self.wait(receipt.run_id.as_str(), None).await?;
        let run = self.store.load(&receipt.run_id)?;
        let result = self.store.load_result(&receipt.run_id)?;
        Ok(SyncReceipt { run, result })
    }

    fn fork_worker(&self, run: &Run) -> Result<(), EngineError> {
        let exe = std::env::current_exe()?;
        let layout = self.store.layout(&run.id);
        let log = worker_log_handle(&layout.worker_log())?;
        let mut command = Command::new(exe);
        command
            .arg("_worker")
            .arg("--run-id")
            .arg(run.id.as_str())
            .arg("--program")
            .arg(&run.program_path)
            .arg("--runs-dir")
            .arg(self.store.root())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log))
            // Own process group: the worker outlives the CLI and must not
            // receive its terminal signals.
            .process_group(0);
        let child = command.spawn()?;
        tracing::debug!(run_id = %run.id, pid = child.id(), "worker forked");
        Ok(())
    }

    pub fn status(&self, run_id: &str) -> Result<RunSummary, EngineError> {
        let run = self.store.load(&RunId::from_string(run_id))?;
        Ok(RunSummary { id: run.id, status: run.status })
    }

    /// Block until the run is terminal or the timeout elapses. Timeouts
    /// never mutate run state.
    pub async fn wait(
        &self,
        run_id: &str,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome, EngineError> {
        let id = RunId::from_string(run_id);
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        let interval = poll::wait_interval();
        loop {
            let run = self.store.load(&id)?;
            if run.status.is_terminal() {
                return Ok(WaitOutcome::Terminal(run.status));
            }
            let sleep = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero() {
                        return Ok(WaitOutcome::TimedOut(run.status));
                    }
                    remaining.min(interval)
                }
                None => interval,
            };
            tokio::time::sleep(sleep).await;
        }
    }

    /// Request cancellation. Idempotent: terminal runs report
    /// `alreadyTerminal` and are left untouched.
    pub fn cancel(&self, run_id: &str) -> Result<CancelReceipt, EngineError> {
        let id = RunId::from_string(run_id);
        let run = self.store.load(&id)?;
        if run.status.is_terminal() {
            return Ok(CancelReceipt { run_id: id, status: run.status, already_terminal: true });
        }
        let events = EventWriter::open(&self.store.layout(&id).events_file(), id)?;
        match events.append(EventKind::RunCancelRequested, serde_json::json!({}), self.clock.now_utc())
        {
            Ok(_) => {
                Ok(CancelReceipt { run_id: id, status: RunStatus::Cancelled, already_terminal: false })
            }
            // Lost the race against the worker's terminal event.
            Err(EventLogError::AfterTerminal(_)) => {
                let run = self.store.load(&id)?;
                Ok(CancelReceipt { run_id: id, status: run.status, already_terminal: true })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stream envelopes to `sink` until the terminal event is observed.
    pub async fn watch(
        &self,
        run_id: &str,
        channel: WatchChannel,
        mut sink: impl FnMut(WatchEnvelope),
    ) -> Result<(), EngineError> {
        let id = RunId::from_string(run_id);
        let run = self.store.load(&id)?;
        let mut reader = EventReader::open(&run.paths.events_file);
        let interval = poll::watch_interval();
        loop {
            for event in reader.read_new()? {
                let terminal = event.is_terminal();
                if let Some(envelope) = WatchEnvelope::from_event(channel, event) {
                    sink(envelope);
                }
                if terminal {
                    return Ok(());
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// All runs, newest first.
    pub fn list(&self) -> Result<Vec<RunSummary>, EngineError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|run| RunSummary { id: run.id, status: run.status })
            .collect())
    }

    /// Raw events currently in a run's log (inspection and tests).
    pub fn events(&self, run_id: &str) -> Result<Vec<Event>, EngineError> {
        let id = RunId::from_string(run_id);
        let run = self.store.load(&id)?;
        let mut reader = EventReader::open(&run.paths.events_file);
        Ok(reader.read_new()?)
    }
}

fn worker_log_handle(path: &Path) -> Result<File, EngineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
