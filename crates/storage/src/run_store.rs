// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run document persistence.
//!
//! `run.json` is replaced atomically (tmp + fsync + rename) so readers never
//! observe a torn document. Reads still tolerate one transient parse failure
//! in case the platform's rename is not atomic with respect to open readers.

use crate::layout::RunLayout;
use mill_core::{Run, RunId, RunResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Delay before the single re-read of a transiently unparsable document.
const REREAD_DELAY: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run not found: {0}")]
    NotFound(String),
    #[error("result not written for run {0}")]
    ResultMissing(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Store of run directories under one runs root.
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self, run_id: &RunId) -> RunLayout {
        RunLayout::new(&self.root, run_id)
    }

    /// Create the run directory skeleton and write the initial document.
    pub fn create(&self, run: &Run) -> Result<RunLayout, StoreError> {
        let layout = self.layout(&run.id);
        fs::create_dir_all(layout.run_dir())?;
        fs::create_dir_all(layout.logs_dir())?;
        fs::create_dir_all(layout.sessions_dir())?;
        self.save(run)?;
        Ok(layout)
    }

    /// Load a run document, retrying once on a transient parse failure.
    pub fn load(&self, run_id: &RunId) -> Result<Run, StoreError> {
        let path = self.layout(run_id).run_file();
        if !path.exists() {
            return Err(StoreError::NotFound(run_id.to_string()));
        }
        match read_json::<Run>(&path) {
            Ok(run) => Ok(run),
            Err(StoreError::Corrupt { .. }) => {
                // A writer may be mid-replace; one re-read settles it.
                std::thread::sleep(REREAD_DELAY);
                read_json(&path)
            }
            Err(e) => Err(e),
        }
    }

    /// Atomically replace `run.json`.
    pub fn save(&self, run: &Run) -> Result<(), StoreError> {
        let layout = self.layout(&run.id);
        write_json_atomic(&layout.run_file(), run)?;
        Ok(())
    }

    /// Write the terminal `result.json`. Written once; the caller owns the
    /// "exactly one terminal" discipline.
    pub fn save_result(&self, result: &RunResult) -> Result<(), StoreError> {
        let layout = self.layout(&result.run_id);
        write_json_atomic(&layout.result_file(), result)?;
        Ok(())
    }

    pub fn load_result(&self, run_id: &RunId) -> Result<RunResult, StoreError> {
        let path = self.layout(run_id).result_file();
        if !path.exists() {
            return Err(StoreError::ResultMissing(run_id.to_string()));
        }
        read_json(&path)
    }

    /// Enumerate all runs, newest first. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<Run>, StoreError> {
        let mut runs = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(runs),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let run_id = RunId::from_string(name);
            match self.load(&run_id) {
                Ok(run) => runs.push(run),
                Err(e) => {
                    tracing::warn!(run_id = name, error = %e, "skipping unreadable run dir");
                }
            }
        }
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|source| StoreError::Corrupt { path: path.to_path_buf(), source })
}

/// Write pretty JSON to `<path>.tmp`, fsync, rename over `path`.
fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(value)
        .map_err(|source| StoreError::Corrupt { path: path.to_path_buf(), source })?;
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "run_store_tests.rs"]
mod tests;
