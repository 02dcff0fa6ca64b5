// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill ls` - list runs, newest first

use crate::error::CliError;
use crate::output::{json_line, paint_status, OutputFormat};
use mill_engine::Supervisor;
use std::path::Path;

pub fn ls(format: OutputFormat, runs_root: &Path) -> Result<(), CliError> {
    let supervisor = Supervisor::new(runs_root);
    let runs = supervisor.list()?;
    match format {
        OutputFormat::Json => json_line(&runs).map_err(CliError::render)?,
        OutputFormat::Text => {
            if runs.is_empty() {
                println!("No runs");
                return Ok(());
            }
            for run in &runs {
                println!("{:<28} {}", run.id, paint_status(run.status));
            }
        }
    }
    Ok(())
}
