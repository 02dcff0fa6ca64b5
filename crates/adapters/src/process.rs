// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver child-process plumbing.
//!
//! One spawn = one child process: stdin closed, stdout/stderr drained
//! continuously so the driver never backs up on a full pipe. Cancellation is
//! cooperative towards the child: SIGTERM on token cancellation, SIGKILL
//! after the grace period.

use mill_core::SpawnInput;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Minimum grace between SIGTERM and SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch {command:?}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed reading driver output: {0}")]
    Read(#[from] std::io::Error),
}

/// How to start a driver process, before per-spawn flags.
#[derive(Debug, Clone)]
pub struct DriverProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl DriverProcessConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), args: Vec::new(), env: Vec::new() }
    }

    /// Per-spawn argv: configured args, then `--model`, `--system-prompt`,
    /// and the prompt as the positional tail.
    pub fn build_args(&self, input: &SpawnInput, normalized_model: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--model".to_string());
        args.push(normalized_model.to_string());
        args.push("--system-prompt".to_string());
        args.push(input.system_prompt.clone());
        args.push(input.prompt.clone());
        args
    }
}

/// Everything captured from one finished (or killed) child.
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    pub exit_code: Option<i32>,
    /// True when the token fired before the child exited on its own.
    pub cancelled: bool,
}

/// Run a driver child to completion, draining both pipes.
pub async fn run_driver_process(
    config: &DriverProcessConfig,
    args: Vec<String>,
    cwd: Option<&PathBuf>,
    cancel: CancellationToken,
) -> Result<ProcessOutput, ProcessError> {
    let mut command = Command::new(&config.command);
    command.args(&args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    for (key, value) in &config.env {
        command.env(key, value);
    }
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|source| ProcessError::Launch { command: config.command.clone(), source })?;

    let stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
    let stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
    let (mut stdout, mut stderr) = match (stdout, stderr) {
        (Some(out), Some(err)) => (out, err),
        // Both pipes were requested above; missing ones mean the child is
        // already unusable.
        _ => {
            let _ = child.start_kill();
            return Err(ProcessError::Read(std::io::Error::other("driver pipes unavailable")));
        }
    };

    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut cancelled = false;
    let mut kill_sent = false;
    // Far-future placeholder until SIGTERM arms the real deadline.
    let mut kill_at = tokio::time::Instant::now() + Duration::from_secs(60 * 60 * 24);

    while !(stdout_done && stderr_done) {
        tokio::select! {
            line = stdout.next_line(), if !stdout_done => match line? {
                Some(line) => stdout_lines.push(line),
                None => stdout_done = true,
            },
            line = stderr.next_line(), if !stderr_done => match line? {
                Some(line) => stderr_lines.push(line),
                None => stderr_done = true,
            },
            _ = cancel.cancelled(), if !cancelled => {
                cancelled = true;
                kill_at = tokio::time::Instant::now() + KILL_GRACE;
                terminate(&child);
            },
            _ = tokio::time::sleep_until(kill_at), if cancelled && !kill_sent => {
                kill_sent = true;
                let _ = child.start_kill();
            },
        }
    }

    let status = child.wait().await?;
    Ok(ProcessOutput { stdout_lines, stderr_lines, exit_code: status.code(), cancelled })
}

/// Best-effort SIGTERM; the child may already be gone.
fn terminate(child: &tokio::process::Child) {
    if let Some(pid) = child.id() {
        let _ = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        );
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
