// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Program document: parsing and validation.

use mill_core::ErrorKind;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("program is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("step {step}: {message}")]
    Invalid { step: usize, message: String },
    #[error("failed reading program: {0}")]
    Io(#[from] std::io::Error),
}

impl ProgramError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgramError::Io(_) => ErrorKind::Runtime,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// One `factory.spawn` request as written in the program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnSpec {
    pub agent: String,
    #[serde(default)]
    pub system_prompt: String,
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    /// When true, a failed spawn fails the whole run instead of only
    /// recording a failed result.
    #[serde(default)]
    pub required: bool,
}

/// `factory.observe.artifact` as written in the program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    pub path: PathBuf,
    pub content: String,
}

/// One program step, discriminated by its key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Sleep {
        sleep_ms: u64,
    },
    Log {
        log: String,
        #[serde(default = "default_level")]
        level: String,
    },
    Spawn {
        spawn: SpawnSpec,
    },
    Parallel {
        parallel: Vec<SpawnSpec>,
    },
    Artifact {
        artifact: ArtifactSpec,
    },
    Fail {
        fail: String,
    },
    Shutdown {
        shutdown: bool,
    },
}

fn default_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// A parsed, validated program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Program {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Program {
    /// Parse and validate program text.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let program: Program = toml::from_str(text)?;
        program.validate()?;
        Ok(program)
    }

    /// Read, parse, and validate a program file.
    pub fn load(path: &Path) -> Result<Self, ProgramError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ProgramError> {
        for (idx, step) in self.steps.iter().enumerate() {
            let step_no = idx + 1;
            let invalid = |message: String| ProgramError::Invalid { step: step_no, message };
            match step {
                Step::Spawn { spawn } => validate_spawn(spawn, step_no)?,
                Step::Parallel { parallel } => {
                    if parallel.is_empty() {
                        return Err(invalid("parallel block has no spawns".into()));
                    }
                    for spec in parallel {
                        validate_spawn(spec, step_no)?;
                    }
                }
                Step::Log { level, .. } => {
                    if !LOG_LEVELS.contains(&level.as_str()) {
                        return Err(invalid(format!(
                            "unknown log level {level:?} (expected one of {LOG_LEVELS:?})"
                        )));
                    }
                }
                Step::Artifact { artifact } => {
                    if !is_safe_relative(&artifact.path) {
                        return Err(invalid(format!(
                            "artifact path {:?} must be relative and stay inside the run dir",
                            artifact.path
                        )));
                    }
                }
                Step::Sleep { .. } | Step::Fail { .. } | Step::Shutdown { .. } => {}
            }
        }
        Ok(())
    }

    /// Total number of spawn requests the program can make.
    pub fn spawn_count(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Spawn { .. } => 1,
                Step::Parallel { parallel } => parallel.len(),
                _ => 0,
            })
            .sum()
    }
}

fn validate_spawn(spec: &SpawnSpec, step_no: usize) -> Result<(), ProgramError> {
    for (field, value) in
        [("agent", &spec.agent), ("prompt", &spec.prompt), ("model", &spec.model)]
    {
        if value.trim().is_empty() {
            return Err(ProgramError::Invalid {
                step: step_no,
                message: format!("spawn {field} must not be empty"),
            });
        }
    }
    Ok(())
}

/// Relative, with no `..` or root components.
fn is_safe_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
