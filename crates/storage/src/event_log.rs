// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only sequenced event log (`events.ndjson`).
//!
//! One writer per process; the worker and the supervisor may both append to
//! the same run's log from different processes (the supervisor writes only
//! `run:cancelRequested`). Sequence assignment is therefore guarded by an
//! advisory file lock: lock, revalidate the last sequence if the file grew
//! underneath us, write one line, unlock. Lines are written with a single
//! `O_APPEND` write and always end in `\n`.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use mill_core::{Event, EventKind, RunId, EVENT_SCHEMA_VERSION};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How much of the file tail to scan when recovering the last sequence.
const TAIL_SCAN_BYTES: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed event line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("run {0} already has a terminal event")]
    AfterTerminal(RunId),
}

struct WriterInner {
    file: File,
    /// File length observed after our last append; a mismatch means another
    /// process appended and the cached sequence is stale.
    seen_len: u64,
    last_sequence: u64,
    terminal_seen: bool,
}

/// Sequenced append writer for one run's event log.
pub struct EventWriter {
    run_id: RunId,
    inner: Mutex<WriterInner>,
}

impl EventWriter {
    /// Open (creating if needed) the log and recover the last sequence from
    /// the file tail.
    pub fn open(path: &Path, run_id: RunId) -> Result<Self, EventLogError> {
        let mut file = OpenOptions::new().create(true).append(true).read(true).open(path)?;
        let seen_len = file.metadata()?.len();
        let last = last_event_in_tail(&mut file, seen_len)?;
        let (last_sequence, terminal_seen) =
            last.map(|e| (e.sequence, e.is_terminal())).unwrap_or((0, false));
        Ok(Self {
            run_id,
            inner: Mutex::new(WriterInner { file, seen_len, last_sequence, terminal_seen }),
        })
    }

    /// Append one event, assigning the next sequence number. Returns the
    /// event as written.
    pub fn append(
        &self,
        kind: EventKind,
        payload: Value,
        at: DateTime<Utc>,
    ) -> Result<Event, EventLogError> {
        let mut inner = self.inner.lock();
        // Cross-process sequence guard. The lock is also the assertion that
        // no second writer holds the file for longer than one append.
        inner.file.lock_exclusive()?;
        let result = self.append_locked(&mut inner, kind, payload, at);
        let _ = fs2::FileExt::unlock(&inner.file);
        result
    }

    fn append_locked(
        &self,
        inner: &mut WriterInner,
        kind: EventKind,
        payload: Value,
        at: DateTime<Utc>,
    ) -> Result<Event, EventLogError> {
        let len = inner.file.metadata()?.len();
        if len != inner.seen_len {
            let last = last_event_in_tail(&mut inner.file, len)?;
            if let Some(last) = last {
                inner.last_sequence = last.sequence;
                inner.terminal_seen = last.is_terminal();
            }
            inner.seen_len = len;
        }
        if inner.terminal_seen {
            return Err(EventLogError::AfterTerminal(self.run_id));
        }

        let event = Event {
            schema_version: EVENT_SCHEMA_VERSION,
            run_id: self.run_id,
            sequence: inner.last_sequence + 1,
            timestamp: at,
            kind,
            payload,
        };
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        inner.file.write_all(&line)?;
        inner.file.flush()?;
        inner.seen_len = inner.file.metadata()?.len();
        inner.last_sequence = event.sequence;
        inner.terminal_seen = event.is_terminal();
        Ok(event)
    }

    /// Sequence of the most recently written (or recovered) event.
    pub fn last_sequence(&self) -> u64 {
        self.inner.lock().last_sequence
    }
}

/// Parse the last complete event line from the file tail.
fn last_event_in_tail(file: &mut File, len: u64) -> Result<Option<Event>, EventLogError> {
    if len == 0 {
        return Ok(None);
    }
    let start = len.saturating_sub(TAIL_SCAN_BYTES);
    file.seek(SeekFrom::Start(start))?;
    let mut tail = String::new();
    file.take(len - start).read_to_string(&mut tail)?;
    let Some(last_line) = tail.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(last_line)?))
}

/// Incremental line-oriented reader.
///
/// Tracks a byte offset and returns only complete (newline-terminated)
/// lines; a partially written trailing line is withheld until a later call
/// observes its newline. Callers poll `read_new` on their own cadence.
pub struct EventReader {
    path: PathBuf,
    offset: u64,
}

impl EventReader {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), offset: 0 }
    }

    /// Read events appended since the previous call. A missing file reads as
    /// empty (the writer may not have created it yet).
    pub fn read_new(&mut self) -> Result<Vec<Event>, EventLogError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata()?.len();
        if len <= self.offset {
            return Ok(Vec::new());
        }
        file.seek(SeekFrom::Start(self.offset))?;
        let mut chunk = Vec::with_capacity((len - self.offset) as usize);
        file.take(len - self.offset).read_to_end(&mut chunk)?;

        // Only consume up to the last newline; the rest is a partial line.
        let Some(cut) = chunk.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &chunk[..=cut];
        let mut events = Vec::new();
        for line in complete.split(|&b| b == b'\n') {
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            events.push(serde_json::from_slice(line)?);
        }
        self.offset += (cut + 1) as u64;
        Ok(events)
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
