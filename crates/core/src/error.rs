// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error classification shared across crates.
//!
//! Library crates carry their own `thiserror` enums; each maps into one of
//! these kinds so logs and envelopes show a stable tag.

use serde::{Deserialize, Serialize};

/// Stable error tags surfaced in logs and CLI envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad CLI arguments or bad spawn input. Recoverable; CLI exit 1.
    InvalidInput,
    /// Requested model is not in the driver catalog. Recoverable; CLI exit 1.
    ModelNotFound,
    /// Run or spawn cancelled by request. Not an error to the CLI.
    Cancelled,
    /// Unexpected condition: codec failure, worker crash, IO error.
    Runtime,
    /// User program refused a required confirmation.
    ConfirmationRejected,
}

impl ErrorKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::ModelNotFound => "MODEL_NOT_FOUND",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Runtime => "RUNTIME",
            ErrorKind::ConfirmationRejected => "CONFIRMATION_REJECTED",
        }
    }
}

crate::simple_display! {
    ErrorKind {
        InvalidInput => "INVALID_INPUT",
        ModelNotFound => "MODEL_NOT_FOUND",
        Cancelled => "CANCELLED",
        Runtime => "RUNTIME",
        ConfirmationRejected => "CONFIRMATION_REJECTED",
    }
}
