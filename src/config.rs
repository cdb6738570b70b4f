//! Tracker configuration
//!
//! Loaded from a camelCase JSON document; every field has a default so a
//! partial file (or no file at all) is valid. A few values can be overridden
//! from the environment for quick experiments.

use crate::engine::EngineOptions;
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum spacing between two recorded pointer samples
pub const DEFAULT_POINTER_THROTTLE_MS: i64 = 50;
/// Hard cap on points per buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 50_000;
/// Points kept after an eviction
pub const DEFAULT_BUFFER_RETAIN: usize = 40_000;
/// "Don't move" window used by the accuracy measurement
pub const DEFAULT_MEASUREMENT_WINDOW_MS: u64 = 5_000;
/// Cadence of live stats reported to the host
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub pointer_throttle_ms: i64,
    pub buffer_capacity: usize,
    pub buffer_retain: usize,
    pub measurement_window_ms: u64,
    pub stats_interval_ms: u64,
    /// Directory session archives are written to; `None` means the working directory
    pub export_dir: Option<PathBuf>,
    pub engine: EngineOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pointer_throttle_ms: DEFAULT_POINTER_THROTTLE_MS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            buffer_retain: DEFAULT_BUFFER_RETAIN,
            measurement_window_ms: DEFAULT_MEASUREMENT_WINDOW_MS,
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
            export_dir: None,
            engine: EngineOptions::default(),
        }
    }
}

impl TrackerConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> TrackerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            TrackerError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;

        tracing::debug!("Loaded tracker config from {}", path.display());
        Ok(config)
    }

    /// Apply `ATTENTION_*` environment overrides
    pub fn with_env_overrides(mut self) -> TrackerResult<Self> {
        if let Some(value) = env_value("ATTENTION_POINTER_THROTTLE_MS") {
            self.pointer_throttle_ms = parse_env("ATTENTION_POINTER_THROTTLE_MS", &value)?;
        }
        if let Some(value) = env_value("ATTENTION_MEASUREMENT_WINDOW_MS") {
            self.measurement_window_ms = parse_env("ATTENTION_MEASUREMENT_WINDOW_MS", &value)?;
        }
        if let Some(value) = env_value("ATTENTION_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(value));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if self.pointer_throttle_ms < 0 {
            return Err(TrackerError::ConfigurationError(
                "pointerThrottleMs must not be negative".to_string(),
            ));
        }
        if self.buffer_retain == 0 || self.buffer_retain >= self.buffer_capacity {
            return Err(TrackerError::ConfigurationError(format!(
                "bufferRetain ({}) must be between 1 and bufferCapacity ({})",
                self.buffer_retain, self.buffer_capacity
            )));
        }
        if self.measurement_window_ms == 0 || self.stats_interval_ms == 0 {
            return Err(TrackerError::ConfigurationError(
                "measurementWindowMs and statsIntervalMs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> TrackerResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TrackerError::ConfigurationError(format!("{} has invalid value {:?}", key, value)))
}
