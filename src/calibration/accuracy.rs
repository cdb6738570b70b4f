//! Accuracy measurement
//!
//! The user stares at the viewport centre while the most recent gaze samples
//! are scored by their distance to it.

use crate::engine::{GazeListener, GazeSample};
use crate::error::{TrackerError, TrackerResult};
use parking_lot::Mutex as ParkingMutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Samples scored per measurement
pub const ACCURACY_SAMPLE_COUNT: usize = 50;

/// Distances below this many pixels score a flat 100
const CENTRE_TOLERANCE_PX: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum AccuracyOutcome {
    /// Rounded mean score, 0..=100
    Measured(u8),
    /// Not enough data to score; displayed as 0% but not a real measurement
    Undetermined { reason: String },
}

impl AccuracyOutcome {
    /// Percentage shown to the user
    pub fn score(&self) -> u8 {
        match self {
            AccuracyOutcome::Measured(percent) => *percent,
            AccuracyOutcome::Undetermined { .. } => 0,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, AccuracyOutcome::Measured(_))
    }
}

/// Score one sample against the centre: 100 at the centre, falling linearly
/// to 0 at half the viewport height, 0 beyond that.
pub fn score_sample(x: f64, y: f64, centre: (f64, f64), half_height: f64) -> f64 {
    let dx = centre.0 - x;
    let dy = centre.1 - y;
    let distance = (dx * dx + dy * dy).sqrt();

    if !distance.is_finite() {
        0.0
    } else if distance < CENTRE_TOLERANCE_PX {
        100.0
    } else if distance <= half_height {
        100.0 - (distance / half_height) * 100.0
    } else {
        0.0
    }
}

/// Mean score of the latest `ACCURACY_SAMPLE_COUNT` samples, rounded
pub fn compute_accuracy(
    samples: &[GazeSample],
    viewport_width: u32,
    viewport_height: u32,
) -> TrackerResult<u8> {
    if samples.len() < ACCURACY_SAMPLE_COUNT {
        return Err(TrackerError::InsufficientSamples {
            available: samples.len(),
            required: ACCURACY_SAMPLE_COUNT,
        });
    }

    let centre = (viewport_width as f64 / 2.0, viewport_height as f64 / 2.0);
    let half_height = viewport_height as f64 / 2.0;
    let recent = &samples[samples.len() - ACCURACY_SAMPLE_COUNT..];

    let total: f64 = recent
        .iter()
        .map(|sample| score_sample(sample.x, sample.y, centre, half_height))
        .sum();
    let mean = total / ACCURACY_SAMPLE_COUNT as f64;

    Ok(mean.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Default)]
struct ProbeInner {
    samples: VecDeque<GazeSample>,
    storing: bool,
}

/// Rolling window of the latest gaze samples, filled only while storing
#[derive(Debug, Clone, Default)]
pub struct AccuracyProbe {
    inner: Arc<ParkingMutex<ProbeInner>>,
}

impl AccuracyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener to register with the engine adapter
    pub fn listener(&self) -> GazeListener {
        let probe = self.clone();
        Arc::new(move |sample| probe.record(sample))
    }

    pub fn start_storing(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.storing = true;
    }

    pub fn stop_storing(&self) {
        self.inner.lock().storing = false;
    }

    pub fn is_storing(&self) -> bool {
        self.inner.lock().storing
    }

    pub fn record(&self, sample: GazeSample) {
        let mut inner = self.inner.lock();
        if !inner.storing {
            return;
        }
        if inner.samples.len() == ACCURACY_SAMPLE_COUNT {
            inner.samples.pop_front();
        }
        inner.samples.push_back(sample);
    }

    pub fn stored(&self) -> Vec<GazeSample> {
        self.inner.lock().samples.iter().copied().collect()
    }
}
