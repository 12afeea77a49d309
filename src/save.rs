//! Persisted session state and the JSON store hosts write it to.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::observer::EngineObserver;
use crate::world::{Farm, GameMode};

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub version: u32,
    pub mode: GameMode,
    pub start_date: NaiveDate,
    pub farm: Farm,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found}, expected {SAVE_VERSION}")]
    UnsupportedVersion { found: u32 },
    #[error("save state is inconsistent: {0}")]
    Invalid(String),
}

pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes through a sibling temp file so a crash never leaves half a save.
    pub fn save(&self, state: &SaveState) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn load(&self) -> Result<SaveState, SaveError> {
        let data = fs::read_to_string(&self.path)?;
        let state: SaveState = serde_json::from_str(&data)?;
        if state.version != SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: state.version,
            });
        }
        Ok(state)
    }
}

/// Writes the save every `interval_weeks` committed weeks.
pub struct AutosaveObserver {
    store: SaveStore,
    interval_weeks: u32,
}

impl AutosaveObserver {
    pub fn new(store: SaveStore, interval_weeks: u32) -> Self {
        Self {
            store,
            interval_weeks,
        }
    }

    fn should_save(&self, week: u32) -> bool {
        self.interval_weeks > 0 && week % self.interval_weeks == 0
    }
}

impl EngineObserver for AutosaveObserver {
    fn week_committed(&mut self, save: &SaveState) {
        let week = save.farm.week_index();
        if !self.should_save(week) {
            return;
        }
        match self.store.save(save) {
            Ok(()) => info!(week, path = %self.store.path().display(), "autosaved"),
            Err(err) => warn!(week, error = %err, "autosave failed"),
        }
    }
}
