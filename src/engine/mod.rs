//! Gaze engine capability
//!
//! The gaze estimator itself is external. This module defines the contract the
//! rest of the crate needs from it (`GazeEngine`) and the adapter that turns
//! an optional, possibly failing engine into a fail-soft capability.

pub mod adapter;

#[cfg(test)]
pub(crate) mod fake;

pub use adapter::{EngineReadiness, GazeEngineAdapter, ListenerId};

use crate::error::TrackerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One estimated look-at position in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeSample {
    pub x: f64,
    pub y: f64,
    /// Unix time in milliseconds
    pub timestamp: i64,
}

/// Callback invoked for every gaze sample
pub type GazeListener = Arc<dyn Fn(GazeSample) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegressionAlgorithm {
    Ridge,
    WeightedRidge,
    ThreadedRidge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerAlgorithm {
    Clmtrackr,
    Facemesh,
}

/// Options pushed to the engine before it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    pub regression_algorithm: RegressionAlgorithm,
    pub tracker_algorithm: TrackerAlgorithm,
    pub show_video_preview: bool,
    pub show_prediction_overlay: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            regression_algorithm: RegressionAlgorithm::Ridge,
            tracker_algorithm: TrackerAlgorithm::Clmtrackr,
            show_video_preview: false,
            show_prediction_overlay: false,
        }
    }
}

/// Contract with an external gaze-estimation engine
///
/// Any estimator that can be configured, started, and can push samples to a
/// listener satisfies this. Failures are reported as
/// `TrackerError::EngineUnavailable`; the adapter decides how to degrade.
#[async_trait]
pub trait GazeEngine: Send + Sync {
    /// Human readable engine name for logs
    fn name(&self) -> &str;

    fn configure(&mut self, options: &EngineOptions) -> TrackerResult<()>;

    /// Start estimation. Resolves once the engine produces samples.
    async fn begin(&mut self) -> TrackerResult<()>;

    fn pause(&mut self);

    /// Replace the engine's single sample listener
    fn set_gaze_listener(&mut self, listener: GazeListener);

    fn show_video_preview(&mut self, visible: bool);

    fn show_prediction_points(&mut self, visible: bool);

    /// Engine-reported accuracy, if it computes one
    fn accuracy(&self) -> Option<f64>;

    /// Feed a known (click) position to the engine's regression
    fn record_screen_position(&mut self, x: f64, y: f64);
}
