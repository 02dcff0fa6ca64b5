// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn runtime: one driver child process per `factory.spawn`.
//!
//! The engine depends only on the [`SpawnRuntime`] trait so worker tests run
//! against a stub instead of real subprocesses.

use crate::catalog::ModelCatalog;
use crate::codec::{CodecError, NormalizedEvent};
use crate::process::{run_driver_process, ProcessError};
use crate::registry::Driver;
use async_trait::async_trait;
use mill_core::{ErrorKind, SpawnInput, SpawnResult};
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid spawn input: {0}")]
    InvalidInput(String),
    #[error("model {model:?} not in driver catalog")]
    ModelNotFound { model: String },
    #[error("spawn cancelled")]
    Cancelled,
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("driver exited ({code}) without a terminal line{stderr_tail}")]
    ExitedWithoutTerminal { code: String, stderr_tail: String },
    #[error("driver output rejected: {0}")]
    Codec(#[from] CodecError),
    #[error("failed writing session transcript: {0}")]
    Transcript(#[source] std::io::Error),
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::InvalidInput(_) => ErrorKind::InvalidInput,
            DriverError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            DriverError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Runtime,
        }
    }
}

/// Resolved location of a driver conversation handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPointer {
    pub driver: String,
    pub session_ref: String,
    pub pointer: PathBuf,
}

/// Decoded outcome of one spawn.
#[derive(Debug, Clone)]
pub struct SpawnOutput {
    pub events: Vec<NormalizedEvent>,
    pub result: SpawnResult,
    pub raw: Vec<String>,
    pub stderr: Vec<String>,
}

#[async_trait]
pub trait SpawnRuntime: Send + Sync {
    fn driver(&self) -> &str;

    async fn spawn(
        &self,
        input: &SpawnInput,
        cancel: CancellationToken,
    ) -> Result<SpawnOutput, DriverError>;

    /// Resolve an opaque session ref to something inspectable, when the
    /// driver keeps on-disk transcripts.
    fn resolve_session(&self, session_ref: &str) -> Option<SessionPointer> {
        let _ = session_ref;
        None
    }
}

/// Production runtime: launches the registered driver process.
pub struct ProcessRuntime {
    driver: Driver,
    catalog: Option<ModelCatalog>,
}

impl ProcessRuntime {
    /// Catalog validation only applies to drivers with a settings file; for
    /// others (and when no catalog source resolves) the driver decides.
    pub fn new(driver: Driver) -> Self {
        let catalog = match driver.tag {
            "pi" => ModelCatalog::resolve(None),
            _ => None,
        };
        Self { driver, catalog }
    }

    pub fn with_catalog(driver: Driver, catalog: Option<ModelCatalog>) -> Self {
        Self { driver, catalog }
    }
}

fn validate(input: &SpawnInput) -> Result<(), DriverError> {
    for (field, value) in
        [("agent", &input.agent), ("prompt", &input.prompt), ("model", &input.model)]
    {
        if value.trim().is_empty() {
            return Err(DriverError::InvalidInput(format!("spawn {field} must not be empty")));
        }
    }
    Ok(())
}

#[async_trait]
impl SpawnRuntime for ProcessRuntime {
    fn driver(&self) -> &str {
        self.driver.tag
    }

    async fn spawn(
        &self,
        input: &SpawnInput,
        cancel: CancellationToken,
    ) -> Result<SpawnOutput, DriverError> {
        validate(input)?;
        if let Some(catalog) = &self.catalog {
            if !catalog.contains(&input.model) {
                return Err(DriverError::ModelNotFound { model: input.model.clone() });
            }
        }

        let normalized = self.driver.normalize_model(&input.model);
        let args = self.driver.process.build_args(input, &normalized);
        tracing::debug!(
            driver = self.driver.tag,
            spawn_id = %input.spawn_id,
            model = %normalized,
            "launching driver process"
        );

        let output =
            run_driver_process(&self.driver.process, args, input.cwd.as_ref(), cancel).await?;

        // Keep the raw transcript next to the run before any decode verdict.
        if let Some(run_dir) = &input.run_directory {
            let sessions = run_dir.join("sessions");
            std::fs::create_dir_all(&sessions).map_err(DriverError::Transcript)?;
            let transcript = output.stdout_lines.join("\n") + "\n";
            std::fs::write(sessions.join(format!("{}.jsonl", input.spawn_id)), transcript)
                .map_err(DriverError::Transcript)?;
        }

        if output.cancelled {
            return Err(DriverError::Cancelled);
        }

        match self.driver.codec.decode(input, &output.stdout_lines) {
            Ok(decoded) => Ok(SpawnOutput {
                events: decoded.events,
                result: decoded.result,
                raw: decoded.raw,
                stderr: output.stderr_lines,
            }),
            Err(CodecError::MissingTerminal) if output.exit_code != Some(0) => {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let stderr_tail = match output.stderr_lines.last() {
                    Some(last) => format!(": {last}"),
                    None => String::new(),
                };
                Err(DriverError::ExitedWithoutTerminal { code, stderr_tail })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_session(&self, session_ref: &str) -> Option<SessionPointer> {
        // Only PI session refs are paths to on-disk transcripts.
        if self.driver.tag != "pi" {
            return None;
        }
        Some(SessionPointer {
            driver: self.driver.tag.to_string(),
            session_ref: session_ref.to_string(),
            pointer: PathBuf::from(session_ref),
        })
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
