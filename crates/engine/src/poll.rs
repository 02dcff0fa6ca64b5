// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll cadences, env-tunable so specs can tighten them.

use std::time::Duration;

/// `wait` polls `run.json` on this cadence (`MILL_WAIT_POLL_MS`).
pub fn wait_interval() -> Duration {
    from_env("MILL_WAIT_POLL_MS", 100)
}

/// Event-log followers (watch, the worker's cancel follower) poll on this
/// cadence (`MILL_WATCH_POLL_MS`). Kept inside the 50–200 ms tail window.
pub fn watch_interval() -> Duration {
    from_env("MILL_WATCH_POLL_MS", 75)
}

fn from_env(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default_ms);
    Duration::from_millis(ms)
}
