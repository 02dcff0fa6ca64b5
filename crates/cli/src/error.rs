// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI failure type: one place where errors become exit codes.
//!
//! The mapping is the §-contract of the CLI surface: bad input and unknown
//! runs exit 1, an elapsed `wait` deadline exits 2 (having already printed
//! the non-terminal status), and `CANCELLED` is not an error at all, so no
//! variant carries it.

use mill_core::ErrorKind;
use mill_engine::EngineError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// `wait --timeout` elapsed before the run went terminal.
    WaitTimeout,
    /// Anything else, tagged with its stable kind.
    Failed { kind: ErrorKind, message: String },
}

impl CliError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CliError::Failed { kind: ErrorKind::InvalidInput, message: message.into() }
    }

    /// Rendering/serialization problems on our side of the pipe.
    pub fn render(e: serde_json::Error) -> Self {
        CliError::Failed { kind: ErrorKind::Runtime, message: e.to_string() }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::WaitTimeout => 2,
            CliError::Failed { .. } => 1,
        }
    }

    /// What to print on stderr, if anything. The timeout path stays silent:
    /// `wait` already reported the current status on stdout.
    pub fn message(&self) -> Option<String> {
        match self {
            CliError::WaitTimeout => None,
            CliError::Failed { kind, message } => Some(format!("[{}] {message}", kind.tag())),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "wait deadline elapsed"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Failed { kind: e.kind(), message: e.to_string() }
    }
}
