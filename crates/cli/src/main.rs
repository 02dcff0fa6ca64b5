// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mill: CLI façade over the run supervisor.
//!
//! Maps commands to supervisor calls and renders either human text or one
//! JSON document per emission (`--json`). Exit codes: 0 success, 1 bad
//! input/unknown run/unknown flags, 2 `wait` timeout.

mod commands;
mod error;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputFormat;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{about}

Usage: {usage}

Commands:
  run <program.ts>   Submit a program as a new run
  status <runId>     Show a run's status
  wait <runId>       Wait until a run reaches a terminal status
  cancel <runId>     Request cancellation of a run
  watch              Stream run events until terminal
  ls                 List runs

Options:
{options}
";

#[derive(Parser)]
#[command(
    name = "mill",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Track, execute, and observe agent program runs",
    override_usage = "mill <command>",
    help_template = HELP_TEMPLATE,
    styles = output::help_styles(),
    disable_help_subcommand = true
)]
struct Cli {
    /// Print JSON envelopes instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Runs root (default: $MILL_RUNS_DIR, then ~/.mill/runs)
    #[arg(long, global = true, value_name = "path")]
    runs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a program as a new run
    Run(commands::run::RunArgs),
    /// Show a run's status
    Status {
        #[arg(value_name = "runId")]
        run_id: String,
    },
    /// Wait until a run reaches a terminal status
    Wait {
        #[arg(value_name = "runId")]
        run_id: String,
        /// Give up (exit 2) after this many seconds
        #[arg(long, value_name = "sec")]
        timeout: Option<u64>,
    },
    /// Request cancellation of a run
    Cancel {
        #[arg(value_name = "runId")]
        run_id: String,
    },
    /// Stream run events until terminal
    Watch(commands::watch::WatchArgs),
    /// List runs
    Ls,
    /// Internal: execute one run to its terminal state
    #[command(name = "_worker", hide = true)]
    Worker(commands::worker::WorkerCmdArgs),
}

fn resolve_runs_root(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("MILL_RUNS_DIR").map(PathBuf::from))
        .or_else(|| dirs::home_dir().map(|home| home.join(".mill/runs")))
        .unwrap_or_else(|| PathBuf::from(".mill/runs"))
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap's own exit code for bad input is 2; the CLI contract is 1.
            use clap::error::ErrorKind;
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return;
    };

    let format = OutputFormat::from_flag(cli.json);
    let runs_root = resolve_runs_root(cli.runs_dir);

    let result = match command {
        Command::Run(args) => commands::run::run(args, format, &runs_root).await,
        Command::Status { run_id } => commands::status::status(&run_id, format, &runs_root),
        Command::Wait { run_id, timeout } => {
            commands::wait::wait(&run_id, timeout, format, &runs_root).await
        }
        Command::Cancel { run_id } => commands::cancel::cancel(&run_id, format, &runs_root),
        Command::Watch(args) => commands::watch::watch(args, format, &runs_root).await,
        Command::Ls => commands::ls::ls(format, &runs_root),
        Command::Worker(args) => commands::worker::worker(args, &runs_root).await,
    };

    if let Err(e) = result {
        if let Some(message) = e.message() {
            eprintln!("{message}");
        }
        std::process::exit(e.exit_code());
    }
}
