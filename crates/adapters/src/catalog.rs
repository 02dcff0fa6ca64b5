// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model catalog.
//!
//! Model ids come from an explicit override or from the PI driver's settings
//! file (`~/.pi/agent/settings.json::enabledModels`). Normalization trims,
//! drops empties, and deduplicates preserving first-seen order.

use indexmap::IndexSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings file location relative to `$HOME`.
const PI_SETTINGS_REL: &str = ".pi/agent/settings.json";

#[derive(Debug, Deserialize)]
struct PiSettings {
    #[serde(default, rename = "enabledModels")]
    enabled_models: Vec<String>,
}

/// Trim, drop empties, dedupe preserving first-seen order. Idempotent.
pub fn normalize_models<I>(models: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen: IndexSet<String> = IndexSet::new();
    for model in models {
        let trimmed = model.as_ref().trim();
        if !trimmed.is_empty() {
            seen.insert(trimmed.to_string());
        }
    }
    seen.into_iter().collect()
}

/// A non-empty, normalized set of known model ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    /// Build from an explicit list; `None` when nothing survives
    /// normalization.
    pub fn from_models<I>(models: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let models = normalize_models(models);
        if models.is_empty() {
            None
        } else {
            Some(Self { models })
        }
    }

    /// Load from the PI settings file under the given home directory.
    /// Missing or unreadable settings mean "no catalog", not an error.
    pub fn from_pi_settings(home: &Path) -> Option<Self> {
        let path = home.join(PI_SETTINGS_REL);
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<PiSettings>(&bytes) {
            Ok(settings) => Self::from_models(settings.enabled_models),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable driver settings");
                None
            }
        }
    }

    /// Resolve a catalog: explicit override first, then the settings file of
    /// the `$HOME` the process sees.
    pub fn resolve(override_models: Option<Vec<String>>) -> Option<Self> {
        if let Some(models) = override_models {
            return Self::from_models(models);
        }
        Self::from_pi_settings(&home_dir()?)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

fn home_dir() -> Option<PathBuf> {
    // HOME first so tests (and callers) can point at a scratch home.
    std::env::var_os("HOME").map(PathBuf::from).or_else(dirs::home_dir)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
