// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill wait` - block until a run is terminal
//!
//! A deadline that elapses first still reports the current status, then
//! exits 2 without touching the run.

use crate::error::CliError;
use crate::output::{format_or_json, paint_status, OutputFormat};
use mill_engine::{RunSummary, Supervisor, WaitOutcome};
use std::path::Path;
use std::time::Duration;

pub async fn wait(
    run_id: &str,
    timeout_secs: Option<u64>,
    format: OutputFormat,
    runs_root: &Path,
) -> Result<(), CliError> {
    let supervisor = Supervisor::new(runs_root);
    let timeout = timeout_secs.map(Duration::from_secs);
    let outcome = supervisor.wait(run_id, timeout).await?;

    let (status, timed_out) = match outcome {
        WaitOutcome::Terminal(status) => (status, false),
        WaitOutcome::TimedOut(status) => (status, true),
    };
    let summary = RunSummary { id: run_id.into(), status };
    format_or_json(format, &summary, || {
        println!("{} {}", summary.id, paint_status(summary.status));
    })
    .map_err(CliError::render)?;

    if timed_out {
        return Err(CliError::WaitTimeout);
    }
    Ok(())
}
