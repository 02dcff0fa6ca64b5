// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill _worker` - internal worker entry point
//!
//! Forked detached by `mill run`; stdout+stderr are already redirected into
//! the run's `logs/worker.log`. Exits 0 whenever the run reached a terminal
//! state (complete, failed, or cancelled); non-zero only when bootstrap
//! fails before any status transition.

use crate::error::CliError;
use clap::Args;
use mill_engine::{run_worker, WorkerArgs};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Args)]
pub struct WorkerCmdArgs {
    #[arg(long = "run-id", value_name = "runId")]
    pub run_id: String,

    #[arg(long, value_name = "path")]
    pub program: PathBuf,
}

pub async fn worker(args: WorkerCmdArgs, runs_root: &Path) -> Result<(), CliError> {
    init_worker_logging();
    run_worker(WorkerArgs {
        run_id: args.run_id,
        program: args.program,
        runs_dir: runs_root.to_path_buf(),
    })
    .await?;
    Ok(())
}

fn init_worker_logging() {
    let filter = EnvFilter::try_from_env("MILL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
