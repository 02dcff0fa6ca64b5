// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch channels and stream envelopes.

use chrono::{DateTime, Utc};
use mill_core::{Event, EventKind, IoPayload, IoSource, IoStream, RunId, SpawnId};
use serde::{Deserialize, Serialize};

/// Which event subset a watcher receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchChannel {
    Events,
    Io,
    All,
}

impl WatchChannel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "events" => Some(WatchChannel::Events),
            "io" => Some(WatchChannel::Io),
            "all" => Some(WatchChannel::All),
            _ => None,
        }
    }

    fn admits(&self, kind: EventKind) -> bool {
        match self {
            WatchChannel::All => true,
            WatchChannel::Io => kind == EventKind::Io,
            WatchChannel::Events => kind != EventKind::Io,
        }
    }
}

mill_core::simple_display! {
    WatchChannel {
        Events => "events",
        Io => "io",
        All => "all",
    }
}

/// One emission of `mill watch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WatchEnvelope {
    #[serde(rename_all = "camelCase")]
    Event { run_id: RunId, event: Event },
    #[serde(rename_all = "camelCase")]
    Io {
        run_id: RunId,
        source: IoSource,
        stream: IoStream,
        line: String,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spawn_id: Option<SpawnId>,
    },
}

impl WatchEnvelope {
    /// Envelope for one log event, filtered by channel. `None` when the
    /// channel does not admit the event (or an io event has a foreign
    /// payload shape, which would be a writer bug).
    pub fn from_event(channel: WatchChannel, event: Event) -> Option<Self> {
        if !channel.admits(event.kind) {
            return None;
        }
        if event.kind == EventKind::Io {
            let payload: IoPayload = serde_json::from_value(event.payload.clone()).ok()?;
            return Some(WatchEnvelope::Io {
                run_id: event.run_id,
                source: payload.source,
                stream: payload.stream,
                line: payload.line,
                timestamp: event.timestamp,
                spawn_id: payload.spawn_id,
            });
        }
        Some(WatchEnvelope::Event { run_id: event.run_id, event })
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
