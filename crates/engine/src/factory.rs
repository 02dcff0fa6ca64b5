// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `factory` capability object a program runs against.
//!
//! Bound to exactly one run. Every spawn appends `spawn:start`, relays the
//! decoded driver events as `spawn:event` (plus `io` lines), and appends one
//! `spawn:result`; driver failures become failed results, never panics or
//! run aborts. The worker owns the run-level cancellation source; the
//! factory fans it out to one child token per spawn.

use crate::error::EngineError;
use mill_adapters::{DriverError, SpawnRuntime};
use mill_core::{
    Clock, ErrorKind, Event, EventKind, ExecutionResult, IoPayload, IoSource, IoStream, RunId,
    SpawnEventPayload, SpawnId, SpawnInput, SpawnResult,
};
use mill_program::SpawnSpec;
use mill_storage::{EventWriter, RunLayout};
use parking_lot::Mutex;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Factory<C: Clock> {
    run_id: RunId,
    driver_tag: String,
    layout: RunLayout,
    events: Arc<EventWriter>,
    runtime: Arc<dyn SpawnRuntime>,
    clock: C,
    /// Parent of every per-spawn token. A child of the run-level cancel
    /// source, so run cancellation reaches outstanding drivers; `shutdown`
    /// cancels it without touching the run-level source.
    spawn_parent: CancellationToken,
    closed: AtomicBool,
    results: Mutex<Vec<SpawnResult>>,
}

impl<C: Clock> Factory<C> {
    pub fn new(
        run_id: RunId,
        driver_tag: String,
        layout: RunLayout,
        events: Arc<EventWriter>,
        runtime: Arc<dyn SpawnRuntime>,
        clock: C,
        run_cancel: &CancellationToken,
    ) -> Self {
        Self {
            run_id,
            driver_tag,
            layout,
            events,
            runtime,
            clock,
            spawn_parent: run_cancel.child_token(),
            closed: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Results of every spawn so far, in completion order.
    pub fn results(&self) -> Vec<SpawnResult> {
        self.results.lock().clone()
    }

    /// Run one driver subprocess. Driver and codec failures come back as a
    /// failed [`ExecutionResult`]; only event-log IO failures error out.
    pub async fn spawn(&self, spec: &SpawnSpec) -> Result<ExecutionResult, EngineError> {
        let spawn_id = SpawnId::generate();
        let input = self.build_input(spawn_id, spec);

        self.append(
            EventKind::SpawnStart,
            serde_json::json!({
                "spawnId": spawn_id,
                "agent": input.agent,
                "model": input.model,
                "driver": self.driver_tag,
            }),
        )?;

        let result = if self.closed.load(Ordering::SeqCst) || self.spawn_parent.is_cancelled() {
            let mut result = SpawnResult::failed(
                &input.agent,
                &input.model,
                &self.driver_tag,
                format!("[{}] spawn refused: run is shutting down", ErrorKind::Cancelled.tag()),
            );
            result.stop_reason = Some("cancelled".to_string());
            result
        } else {
            match self.runtime.spawn(&input, self.spawn_parent.child_token()).await {
                Ok(output) => {
                    for line in &output.raw {
                        self.append_io(IoSource::Driver, IoStream::Stdout, line, Some(spawn_id))?;
                    }
                    for line in &output.stderr {
                        self.append_io(IoSource::Driver, IoStream::Stderr, line, Some(spawn_id))?;
                    }
                    for event in &output.events {
                        self.append(
                            EventKind::SpawnEvent,
                            serde_json::to_value(SpawnEventPayload {
                                spawn_id,
                                event: event.to_value(),
                            })
                            .unwrap_or_default(),
                        )?;
                    }
                    output.result
                }
                Err(e) => self.failed_result(&input, &e),
            }
        };

        self.append(
            EventKind::SpawnResult,
            serde_json::json!({ "spawnId": spawn_id, "result": result }),
        )?;
        self.results.lock().push(result.clone());
        Ok(ExecutionResult::from_result(spawn_id, &result))
    }

    fn failed_result(&self, input: &SpawnInput, error: &DriverError) -> SpawnResult {
        tracing::warn!(
            run_id = %self.run_id,
            spawn_id = %input.spawn_id,
            kind = error.kind().tag(),
            error = %error,
            "spawn failed"
        );
        let mut result = SpawnResult::failed(
            &input.agent,
            &input.model,
            &self.driver_tag,
            format!("[{}] {}", error.kind().tag(), error),
        );
        if error.kind() == ErrorKind::Cancelled {
            result.stop_reason = Some("cancelled".to_string());
        }
        result
    }

    fn build_input(&self, spawn_id: SpawnId, spec: &SpawnSpec) -> SpawnInput {
        let cwd = match &spec.cwd {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.layout.run_dir().join(dir),
            None => self.layout.run_dir().to_path_buf(),
        };
        SpawnInput {
            run_id: self.run_id,
            spawn_id,
            agent: spec.agent.clone(),
            system_prompt: spec.system_prompt.clone(),
            prompt: spec.prompt.clone(),
            model: spec.model.clone(),
            run_directory: Some(self.layout.run_dir().to_path_buf()),
            cwd: Some(cwd),
            tools: spec.tools.clone(),
        }
    }

    /// `factory.observe.log`: a program-sourced `io` event plus a tracing
    /// record in the worker log.
    pub fn observe_log(&self, level: &str, message: &str) -> Result<(), EngineError> {
        match level {
            "debug" => tracing::debug!(run_id = %self.run_id, "{message}"),
            "warn" => tracing::warn!(run_id = %self.run_id, "{message}"),
            "error" => tracing::error!(run_id = %self.run_id, "{message}"),
            _ => tracing::info!(run_id = %self.run_id, "{message}"),
        }
        let stream = if level == "error" { IoStream::Stderr } else { IoStream::Stdout };
        self.append_io(IoSource::Program, stream, message, None)
    }

    /// `factory.observe.artifact`: write content under `artifacts/`.
    /// Escaping paths and write failures yield `None`.
    pub fn observe_artifact(&self, rel_path: &Path, content: &str) -> Option<PathBuf> {
        if rel_path.as_os_str().is_empty()
            || !rel_path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            tracing::warn!(run_id = %self.run_id, path = %rel_path.display(), "artifact path escapes run dir");
            return None;
        }
        let target = self.layout.artifacts_dir().join(rel_path);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, content)
        };
        match write() {
            Ok(()) => Some(target),
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, error = %e, "artifact write failed");
                None
            }
        }
    }

    /// `factory.shutdown`: refuse further spawns; optionally cancel the ones
    /// still running.
    pub fn shutdown(&self, cancel_running: bool) {
        self.closed.store(true, Ordering::SeqCst);
        if cancel_running {
            self.spawn_parent.cancel();
        }
    }

    fn append(&self, kind: EventKind, payload: serde_json::Value) -> Result<Event, EngineError> {
        Ok(self.events.append(kind, payload, self.clock.now_utc())?)
    }

    fn append_io(
        &self,
        source: IoSource,
        stream: IoStream,
        line: &str,
        spawn_id: Option<SpawnId>,
    ) -> Result<(), EngineError> {
        let payload = IoPayload { source, stream, line: line.to_string(), spawn_id };
        self.append(EventKind::Io, serde_json::to_value(payload).unwrap_or_default())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
