use super::{EngineOptions, GazeEngine, GazeListener, GazeSample};
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;

/// Handle returned when a gaze listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Result of starting the engine. Never an error: a missing or broken engine
/// is reported as `NotReady` and simply produces no samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReadiness {
    NotStarted,
    Ready,
    NotReady { reason: String },
}

impl EngineReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineReadiness::Ready)
    }
}

type ListenerTable = Arc<ParkingMutex<Vec<(ListenerId, GazeListener)>>>;

/// Fail-soft wrapper around an injected gaze engine
///
/// Fans every engine sample out to any number of listeners (capture pipeline,
/// accuracy probe) and keeps the engine's visual overlays under control.
pub struct GazeEngineAdapter {
    engine: Option<Box<dyn GazeEngine>>,
    options: EngineOptions,
    readiness: EngineReadiness,
    listeners: ListenerTable,
    next_listener: u64,
}

impl GazeEngineAdapter {
    pub fn new(engine: Box<dyn GazeEngine>, options: EngineOptions) -> Self {
        Self {
            engine: Some(engine),
            options,
            readiness: EngineReadiness::NotStarted,
            listeners: Arc::new(ParkingMutex::new(Vec::new())),
            next_listener: 0,
        }
    }

    /// Adapter with no engine behind it. `start()` reports `NotReady`.
    pub fn unavailable(options: EngineOptions) -> Self {
        Self {
            engine: None,
            options,
            readiness: EngineReadiness::NotStarted,
            listeners: Arc::new(ParkingMutex::new(Vec::new())),
            next_listener: 0,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn readiness(&self) -> &EngineReadiness {
        &self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Store options and apply them immediately if an engine is present
    pub fn configure(&mut self, options: EngineOptions) {
        self.options = options;
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.configure(&self.options) {
                tracing::warn!("Gaze engine rejected configuration: {}", e);
            }
            engine.show_video_preview(self.options.show_video_preview);
            engine.show_prediction_points(self.options.show_prediction_overlay);
        }
    }

    /// Start the engine (idempotent once ready)
    pub async fn start(&mut self) -> EngineReadiness {
        if self.readiness.is_ready() {
            return self.readiness.clone();
        }

        let Some(engine) = self.engine.as_mut() else {
            tracing::warn!("No gaze engine available; gaze capture will produce no samples");
            self.readiness = EngineReadiness::NotReady {
                reason: "no gaze engine configured".to_string(),
            };
            return self.readiness.clone();
        };

        let listeners = self.listeners.clone();
        let dispatcher: GazeListener = Arc::new(move |sample: GazeSample| {
            dispatch(&listeners, sample);
        });

        let started = match engine.configure(&self.options) {
            Ok(()) => {
                engine.set_gaze_listener(dispatcher);
                engine.show_video_preview(self.options.show_video_preview);
                engine.show_prediction_points(self.options.show_prediction_overlay);
                engine.begin().await
            }
            Err(e) => Err(e),
        };

        self.readiness = match started {
            Ok(()) => {
                tracing::info!(
                    "Gaze engine {} ready (regression={:?}, tracker={:?})",
                    engine.name(),
                    self.options.regression_algorithm,
                    self.options.tracker_algorithm
                );
                EngineReadiness::Ready
            }
            Err(e) => {
                tracing::warn!("Gaze engine {} failed to start: {}", engine.name(), e);
                EngineReadiness::NotReady {
                    reason: e.to_string(),
                }
            }
        };
        self.readiness.clone()
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
        }
        if self.readiness.is_ready() {
            self.readiness = EngineReadiness::NotStarted;
        }
    }

    /// Register a sample callback. Works before `start()`; samples flow once
    /// the engine is ready.
    pub fn on_gaze_sample(&mut self, callback: GazeListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.lock().push((id, callback));
        id
    }

    pub fn remove_gaze_listener(&mut self, id: ListenerId) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Engine-reported accuracy; `None` when unknown or no engine is running
    pub fn accuracy(&self) -> Option<f64> {
        if !self.readiness.is_ready() {
            return None;
        }
        self.engine.as_ref().and_then(|engine| engine.accuracy())
    }

    pub fn record_calibration_click(&mut self, x: f64, y: f64) {
        if !self.readiness.is_ready() {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.record_screen_position(x, y);
        }
    }

    /// Toggle the camera preview and prediction marker
    pub fn set_overlays(&mut self, video_preview: bool, prediction_overlay: bool) {
        self.options.show_video_preview = video_preview;
        self.options.show_prediction_overlay = prediction_overlay;
        if let Some(engine) = self.engine.as_mut() {
            engine.show_video_preview(video_preview);
            engine.show_prediction_points(prediction_overlay);
        }
    }
}

fn dispatch(listeners: &ListenerTable, sample: GazeSample) {
    // Snapshot so callbacks can run without holding the table lock
    let targets: Vec<GazeListener> = listeners
        .lock()
        .iter()
        .map(|(_, listener)| listener.clone())
        .collect();
    for listener in targets {
        listener(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_missing_engine_is_not_ready() {
        let mut adapter = GazeEngineAdapter::unavailable(EngineOptions::default());
        let readiness = adapter.start().await;

        assert!(matches!(readiness, EngineReadiness::NotReady { .. }));
        assert_eq!(adapter.accuracy(), None);
    }

    #[tokio::test]
    async fn test_failing_engine_fails_soft() {
        let (engine, _handle) = FakeEngine::failing();
        let mut adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());

        let readiness = adapter.start().await;
        assert!(!readiness.is_ready());
    }

    #[tokio::test]
    async fn test_samples_fan_out_to_all_listeners() {
        let (engine, handle) = FakeEngine::new();
        let mut adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = first.clone();
        let s = second.clone();
        adapter.on_gaze_sample(Arc::new(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        let second_id = adapter.on_gaze_sample(Arc::new(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(adapter.start().await.is_ready());
        handle.emit(10.0, 20.0, 1);
        adapter.remove_gaze_listener(second_id);
        handle.emit(11.0, 21.0, 2);

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlays_are_off_by_default() {
        let (engine, handle) = FakeEngine::new();
        let mut adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());
        adapter.start().await;

        assert_eq!(handle.overlays(), (false, false));
        adapter.set_overlays(true, true);
        assert_eq!(handle.overlays(), (true, true));
    }

    #[tokio::test]
    async fn test_calibration_clicks_reach_engine_only_when_ready() {
        let (engine, handle) = FakeEngine::new();
        let mut adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());

        adapter.record_calibration_click(1.0, 1.0);
        assert!(handle.recorded_clicks().is_empty());

        adapter.start().await;
        adapter.record_calibration_click(5.0, 6.0);
        assert_eq!(handle.recorded_clicks(), vec![(5.0, 6.0)]);
    }
}
