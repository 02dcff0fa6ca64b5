// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mill-program: the declarative program dialect a run executes.
//!
//! A program is a TOML document with one `[[step]]` array. The worker
//! interprets steps in order against the run's `factory` capability object;
//! `spawn` and `parallel` steps become driver subprocesses.

pub mod step;

pub use step::{Program, ProgramError, SpawnSpec, Step};
