// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill cancel` - request cancellation of a run

use crate::error::CliError;
use crate::output::{format_or_json, paint_status, OutputFormat};
use mill_engine::Supervisor;
use std::path::Path;

pub fn cancel(run_id: &str, format: OutputFormat, runs_root: &Path) -> Result<(), CliError> {
    let supervisor = Supervisor::new(runs_root);
    let receipt = supervisor.cancel(run_id)?;
    format_or_json(format, &receipt, || {
        if receipt.already_terminal {
            println!(
                "Run {} was already terminal ({})",
                receipt.run_id,
                paint_status(receipt.status)
            );
        } else {
            println!("Cancelled run {}", receipt.run_id);
        }
    })
    .map_err(CliError::render)
}
