// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill status` - show a run's status

use crate::error::CliError;
use crate::output::{format_or_json, paint_status, OutputFormat};
use mill_engine::Supervisor;
use std::path::Path;

pub fn status(run_id: &str, format: OutputFormat, runs_root: &Path) -> Result<(), CliError> {
    let supervisor = Supervisor::new(runs_root);
    let summary = supervisor.status(run_id)?;
    format_or_json(format, &summary, || {
        println!("{} {}", summary.id, paint_status(summary.status));
    })
    .map_err(CliError::render)
}
