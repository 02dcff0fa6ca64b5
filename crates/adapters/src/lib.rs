// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mill-adapters: the driver layer.
//!
//! A driver is an adapter for one LLM backend: a process config (how to
//! launch it), a codec (how to read its line-delimited stdout), and a spawn
//! runtime (process lifecycle + cancellation). The engine only sees the
//! [`SpawnRuntime`] trait.

pub mod catalog;
pub mod codec;
pub mod process;
pub mod registry;
pub mod runtime;

pub use catalog::{normalize_models, ModelCatalog};
pub use codec::{Codec, CodecError, Decoded, NormalizedEvent};
pub use process::DriverProcessConfig;
pub use registry::{resolve_driver, Driver, KNOWN_DRIVERS};
pub use runtime::{DriverError, ProcessRuntime, SessionPointer, SpawnOutput, SpawnRuntime};
