// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver registry.
//!
//! A driver = tag + process config + codec. Commands default to the tag name
//! on `$PATH` and can be overridden per tag via `MILL_DRIVER_CMD_<TAG>`
//! (dev/test hook; specs point it at a stub script).

use crate::codec::{ClaudeCodec, Codec, CodexCodec, PiCodec};
use crate::process::DriverProcessConfig;
use std::sync::Arc;

/// Driver tags mill ships codecs for.
pub const KNOWN_DRIVERS: [&str; 3] = ["pi", "claude", "codex"];

/// One registered driver backend.
#[derive(Clone)]
pub struct Driver {
    pub tag: &'static str,
    pub process: DriverProcessConfig,
    pub codec: Arc<dyn Codec>,
}

impl Driver {
    /// Model id as the driver binary expects it. The Claude CLI takes an
    /// unqualified id, so `provider/name` collapses to `name`.
    pub fn normalize_model(&self, model: &str) -> String {
        match self.tag {
            "claude" => model.rsplit('/').next().unwrap_or(model).to_string(),
            _ => model.to_string(),
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("tag", &self.tag).field("process", &self.process).finish()
    }
}

/// Look up a driver by tag. `None` for unknown tags.
pub fn resolve_driver(tag: &str) -> Option<Driver> {
    let (tag, codec): (&'static str, Arc<dyn Codec>) = match tag {
        "pi" => ("pi", Arc::new(PiCodec)),
        "claude" => ("claude", Arc::new(ClaudeCodec)),
        "codex" => ("codex", Arc::new(CodexCodec)),
        _ => return None,
    };
    let command = std::env::var(format!("MILL_DRIVER_CMD_{}", tag.to_uppercase()))
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| tag.to_string());
    Some(Driver { tag, process: DriverProcessConfig::new(command), codec })
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
