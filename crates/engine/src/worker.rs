// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker: executes one run's program and owns every state transition.
//!
//! Invoked as `mill _worker --run-id <id> --program <path> --runs-dir
//! <root>` in a detached process. Reentry against a terminal run is a no-op.
//! Cancellation is data-plane: a follower tails the run's own event log for
//! `run:cancelRequested` and trips the run-level token; each spawn holds a
//! child of it.

use crate::error::EngineError;
use crate::factory::Factory;
use crate::poll;
use mill_adapters::{resolve_driver, ProcessRuntime, SpawnRuntime};
use mill_core::{Clock, EventKind, RunId, RunResult, RunStatus, SystemClock};
use mill_program::{Program, Step};
use mill_storage::{EventReader, EventWriter, RunStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Parsed `_worker` arguments.
#[derive(Debug, Clone)]
pub struct WorkerArgs {
    pub run_id: String,
    pub program: PathBuf,
    pub runs_dir: PathBuf,
}

/// How the program ended, before terminal bookkeeping.
#[derive(Debug)]
enum Outcome {
    Complete,
    Failed(String),
    Cancelled,
}

/// Production entry point: resolve the run's driver and execute.
pub async fn run_worker(args: WorkerArgs) -> Result<(), EngineError> {
    let store = RunStore::new(&args.runs_dir);
    let run_id = RunId::from_string(&args.run_id);
    let run = store.load(&run_id)?;
    let driver = resolve_driver(&run.driver)
        .ok_or_else(|| EngineError::InvalidInput(format!("unknown driver: {}", run.driver)))?;
    let runtime: Arc<dyn SpawnRuntime> = Arc::new(ProcessRuntime::new(driver));
    run_worker_with(store, run_id, &args.program, runtime, SystemClock).await
}

/// Execute a run with an injected spawn runtime (tests use a stub).
pub async fn run_worker_with<C: Clock>(
    store: RunStore,
    run_id: RunId,
    submitted_program: &Path,
    runtime: Arc<dyn SpawnRuntime>,
    clock: C,
) -> Result<(), EngineError> {
    let mut run = store.load(&run_id)?;
    if run.status.is_terminal() {
        tracing::info!(run_id = %run_id, status = %run.status, "run already terminal");
        return Ok(());
    }

    let layout = store.layout(&run_id);
    if !layout.program_file().exists() {
        std::fs::copy(submitted_program, layout.program_file())?;
    }
    let events = Arc::new(EventWriter::open(&layout.events_file(), run_id)?);

    if run.status == RunStatus::Pending {
        run.transition(RunStatus::Running, clock.now_utc());
        store.save(&run)?;
    }

    let run_cancel = CancellationToken::new();
    let follower_stop = CancellationToken::new();
    let follower = tokio::spawn(cancel_follower(
        layout.events_file(),
        run_cancel.clone(),
        follower_stop.clone(),
    ));

    let factory = Arc::new(Factory::new(
        run_id,
        run.driver.clone(),
        layout.clone(),
        Arc::clone(&events),
        runtime,
        clock.clone(),
        &run_cancel,
    ));

    let outcome = match Program::load(&layout.program_file()) {
        Err(e) => Outcome::Failed(format!("[{}] {}", e.kind().tag(), e)),
        Ok(program) => match execute_program(&factory, &program, &run_cancel).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(format!("[{}] {}", e.kind().tag(), e)),
        },
    };
    // Cancellation observed before the program returned beats completion.
    let outcome = match outcome {
        Outcome::Complete if run_cancel.is_cancelled() => Outcome::Cancelled,
        other => other,
    };

    follower_stop.cancel();
    let _ = follower.await;

    let (status, terminal_kind, error_message) = match outcome {
        Outcome::Complete => (RunStatus::Complete, EventKind::RunComplete, None),
        Outcome::Failed(message) => (RunStatus::Failed, EventKind::RunFailed, Some(message)),
        Outcome::Cancelled => (RunStatus::Cancelled, EventKind::RunCancelled, None),
    };
    tracing::info!(run_id = %run_id, status = %status, "run finished");

    store.save_result(&RunResult {
        run_id,
        status,
        spawns: factory.results(),
        error_message: error_message.clone(),
    })?;
    let payload = match &error_message {
        Some(message) => serde_json::json!({ "errorMessage": message }),
        None => serde_json::json!({}),
    };
    events.append(terminal_kind, payload, clock.now_utc())?;
    run.transition(status, clock.now_utc());
    store.save(&run)?;
    Ok(())
}

async fn execute_program<C: Clock>(
    factory: &Arc<Factory<C>>,
    program: &Program,
    cancel: &CancellationToken,
) -> Result<Outcome, EngineError> {
    for step in &program.steps {
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        match step {
            Step::Sleep { sleep_ms } => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(*sleep_ms)) => {}
                    _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                }
            }
            Step::Log { log, level } => factory.observe_log(level, log)?,
            Step::Spawn { spawn } => {
                let result = factory.spawn(spawn).await?;
                if spawn.required && result.exit_code != 0 {
                    return Ok(Outcome::Failed(required_failure(&spawn.agent, &result.error_message)));
                }
            }
            Step::Parallel { parallel } => {
                let mut tasks = tokio::task::JoinSet::new();
                for spec in parallel.clone() {
                    let factory = Arc::clone(factory);
                    tasks.spawn(async move {
                        let result = factory.spawn(&spec).await;
                        (spec, result)
                    });
                }
                while let Some(joined) = tasks.join_next().await {
                    let (spec, result) = match joined {
                        Ok(pair) => pair,
                        Err(e) => {
                            while tasks.join_next().await.is_some() {}
                            return Ok(Outcome::Failed(format!("[RUNTIME] spawn task died: {e}")));
                        }
                    };
                    let result = result?;
                    if spec.required && result.exit_code != 0 {
                        // Remaining siblings keep running to record results;
                        // the run still fails.
                        while tasks.join_next().await.is_some() {}
                        return Ok(Outcome::Failed(required_failure(
                            &spec.agent,
                            &result.error_message,
                        )));
                    }
                }
            }
            Step::Artifact { artifact } => {
                factory.observe_artifact(&artifact.path, &artifact.content);
            }
            Step::Fail { fail } => return Ok(Outcome::Failed(fail.clone())),
            Step::Shutdown { shutdown } => factory.shutdown(*shutdown),
        }
    }
    Ok(Outcome::Complete)
}

fn required_failure(agent: &str, error_message: &Option<String>) -> String {
    match error_message {
        Some(message) => format!("required spawn {agent:?} failed: {message}"),
        None => format!("required spawn {agent:?} failed"),
    }
}

/// Tail the run's own event log for `run:cancelRequested`.
async fn cancel_follower(events_file: PathBuf, cancel: CancellationToken, stop: CancellationToken) {
    let mut reader = EventReader::open(events_file);
    let interval = poll::watch_interval();
    loop {
        match reader.read_new() {
            Ok(events) => {
                for event in events {
                    if event.kind == EventKind::RunCancelRequested {
                        tracing::info!(run_id = %event.run_id, "cancel requested");
                        cancel.cancel();
                        return;
                    }
                    if event.is_terminal() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "cancel follower read failed"),
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.cancelled() => return,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
