use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::tracker::DEFAULT_LOW_QUALITY_THRESHOLD;

pub const DEFAULT_DATABASE_FILE: &str = "sleep_history_database.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerSettings {
    pub database_file: String,
    pub low_quality_threshold: i32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DATABASE_FILE.into(),
            low_quality_threshold: DEFAULT_LOW_QUALITY_THRESHOLD,
        }
    }
}

/// `settings.json` in the data directory.
pub struct SettingsStore {
    path: PathBuf,
    data: TrackerSettings,
}

impl SettingsStore {
    /// Reads `path`, falling back to defaults when it is missing or
    /// malformed. A missing file is created with the defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed settings in {}: {err}",
                    path.display()
                );
                TrackerSettings::default()
            })
        } else {
            let defaults = TrackerSettings::default();
            persist(&path, &defaults)?;
            defaults
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.data
    }

    /// Database file resolved against `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.data.database_file)
    }
}

fn persist(path: &Path, data: &TrackerSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(data)?;
    fs::write(path, serialized)
        .with_context(|| format!("Failed to write settings to {}", path.display()))
}
