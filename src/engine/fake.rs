//! Scripted gaze engine used by tests

use super::{EngineOptions, GazeEngine, GazeListener, GazeSample};
use crate::error::{TrackerError, TrackerResult};
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;

#[derive(Default)]
struct FakeShared {
    listener: Option<GazeListener>,
    running: bool,
    video_preview: bool,
    prediction_points: bool,
    clicks: Vec<(f64, f64)>,
    accuracy: Option<f64>,
}

pub(crate) struct FakeEngine {
    shared: Arc<ParkingMutex<FakeShared>>,
    fail_on_begin: bool,
}

/// Test-side handle for pushing samples and inspecting engine state
#[derive(Clone)]
pub(crate) struct FakeEngineHandle {
    shared: Arc<ParkingMutex<FakeShared>>,
}

impl FakeEngine {
    pub(crate) fn new() -> (Self, FakeEngineHandle) {
        Self::build(false)
    }

    pub(crate) fn failing() -> (Self, FakeEngineHandle) {
        Self::build(true)
    }

    fn build(fail_on_begin: bool) -> (Self, FakeEngineHandle) {
        let shared = Arc::new(ParkingMutex::new(FakeShared::default()));
        (
            Self {
                shared: shared.clone(),
                fail_on_begin,
            },
            FakeEngineHandle { shared },
        )
    }
}

impl FakeEngineHandle {
    /// Push one sample to the registered listener if the engine is running
    pub(crate) fn emit(&self, x: f64, y: f64, timestamp: i64) {
        let listener = {
            let shared = self.shared.lock();
            if !shared.running {
                return;
            }
            shared.listener.clone()
        };
        if let Some(listener) = listener {
            listener(GazeSample { x, y, timestamp });
        }
    }

    pub(crate) fn overlays(&self) -> (bool, bool) {
        let shared = self.shared.lock();
        (shared.video_preview, shared.prediction_points)
    }

    pub(crate) fn recorded_clicks(&self) -> Vec<(f64, f64)> {
        self.shared.lock().clicks.clone()
    }

    pub(crate) fn set_accuracy(&self, accuracy: Option<f64>) {
        self.shared.lock().accuracy = accuracy;
    }

    pub(crate) fn is_running(&self) -> bool {
        self.shared.lock().running
    }
}

#[async_trait]
impl GazeEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn configure(&mut self, _options: &EngineOptions) -> TrackerResult<()> {
        Ok(())
    }

    async fn begin(&mut self) -> TrackerResult<()> {
        if self.fail_on_begin {
            return Err(TrackerError::EngineUnavailable(
                "camera permission denied".to_string(),
            ));
        }
        self.shared.lock().running = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.shared.lock().running = false;
    }

    fn set_gaze_listener(&mut self, listener: GazeListener) {
        self.shared.lock().listener = Some(listener);
    }

    fn show_video_preview(&mut self, visible: bool) {
        self.shared.lock().video_preview = visible;
    }

    fn show_prediction_points(&mut self, visible: bool) {
        self.shared.lock().prediction_points = visible;
    }

    fn accuracy(&self) -> Option<f64> {
        self.shared.lock().accuracy
    }

    fn record_screen_position(&mut self, x: f64, y: f64) {
        self.shared.lock().clicks.push((x, y));
    }
}
