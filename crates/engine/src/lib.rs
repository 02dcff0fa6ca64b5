// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mill-engine: run lifecycle.
//!
//! The [`Supervisor`] owns the operations the CLI exposes (submit, status,
//! wait, cancel, watch, list); the worker owns every state transition of its
//! run. They meet only on disk: `run.json`, the event log, `result.json`.

pub mod error;
pub mod factory;
pub mod poll;
pub mod supervisor;
pub mod watch;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::EngineError;
pub use factory::Factory;
pub use supervisor::{
    CancelReceipt, RunSummary, SubmitOptions, SubmitReceipt, Supervisor, SyncReceipt, WaitOutcome,
};
pub use watch::{WatchChannel, WatchEnvelope};
pub use worker::{run_worker, run_worker_with, WorkerArgs};
