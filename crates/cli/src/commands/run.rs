// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill run` - submit a program as a new run

use crate::error::CliError;
use crate::output::{dim, json_line, paint_status, OutputFormat};
use clap::Args;
use mill_core::{DEFAULT_DRIVER, DEFAULT_EXECUTOR};
use mill_engine::{SubmitOptions, Supervisor};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct RunArgs {
    /// Program to execute
    #[arg(value_name = "program.ts")]
    pub program: PathBuf,

    /// Block until the run is terminal and print the combined envelope
    #[arg(long)]
    pub sync: bool,

    /// Driver tag for `factory.spawn` subprocesses
    #[arg(long, value_name = "tag", default_value = DEFAULT_DRIVER)]
    pub driver: String,

    /// Executor tag (only "direct" is supported)
    #[arg(long, value_name = "tag", default_value = DEFAULT_EXECUTOR)]
    pub executor: String,
}

pub async fn run(args: RunArgs, format: OutputFormat, runs_root: &Path) -> Result<(), CliError> {
    let supervisor = Supervisor::new(runs_root);
    let options = SubmitOptions { driver: args.driver, executor: args.executor };

    if args.sync {
        let receipt = supervisor.submit_sync(&args.program, &options).await?;
        match format {
            OutputFormat::Json => json_line(&receipt).map_err(CliError::render)?,
            OutputFormat::Text => {
                println!(
                    "Run {} {} ({} spawn(s))",
                    receipt.run.id,
                    paint_status(receipt.run.status),
                    receipt.result.spawns.len()
                );
                if let Some(message) = &receipt.result.error_message {
                    eprintln!("  {message}");
                }
            }
        }
        return Ok(());
    }

    let receipt = supervisor.submit(&args.program, &options)?;
    match format {
        OutputFormat::Json => json_line(&receipt).map_err(CliError::render)?,
        OutputFormat::Text => {
            println!("Run {} submitted ({})", receipt.run_id, paint_status(receipt.status));
            println!("  {}", dim(&receipt.paths.run_dir.display().to_string()));
        }
    }
    Ok(())
}
