//! Persisted user flags
//!
//! Only the "calibrated" flag survives between sessions. It is stored as a
//! small JSON document next to the host's other state.

use crate::error::{TrackerError, TrackerResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    calibrated: bool,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Open the store at `path`. An unreadable document falls back to defaults.
    pub fn new(path: PathBuf) -> TrackerResult<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt settings at {}: {}", path.display(), e);
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings::default()),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.data.read().calibrated
    }

    pub fn set_calibrated(&self, calibrated: bool) -> TrackerResult<()> {
        let mut guard = self.data.write();
        guard.calibrated = calibrated;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> TrackerResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(data)
            .map_err(|e| TrackerError::ConfigurationError(e.to_string()))?;
        fs::write(path, serialized)?;
        tracing::debug!("Persisted settings to {}", path.display());
        Ok(())
    }
}
