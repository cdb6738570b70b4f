use super::accuracy::{compute_accuracy, AccuracyOutcome, AccuracyProbe};
use super::state::{CalibrationPhase, CalibrationState, CalibrationTarget, ClickOutcome, TargetVisual};
use crate::engine::{EngineReadiness, GazeEngineAdapter, ListenerId};
use crate::error::{TrackerError, TrackerResult};
use crate::settings::SettingsStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Drives the calibration state machine against a live engine
pub struct CalibrationController {
    state: CalibrationState,
    probe: AccuracyProbe,
    probe_listener: Option<ListenerId>,
    settings: Arc<SettingsStore>,
    measurement_window: Duration,
    /// Set while the "don't move" window is open
    input_frozen: Arc<AtomicBool>,
}

impl CalibrationController {
    pub fn new(settings: Arc<SettingsStore>, measurement_window: Duration) -> Self {
        Self {
            state: CalibrationState::new(),
            probe: AccuracyProbe::new(),
            probe_listener: None,
            settings,
            measurement_window,
            input_frozen: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> &CalibrationPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn target_visuals(&self) -> Vec<(CalibrationTarget, TargetVisual)> {
        CalibrationTarget::ALL
            .iter()
            .map(|&target| (target, self.state.target_visual(target)))
            .collect()
    }

    /// True while pointer movement must be ignored
    pub fn is_input_frozen(&self) -> bool {
        self.input_frozen.load(Ordering::SeqCst)
    }

    pub fn is_calibrated(&self) -> bool {
        self.settings.is_calibrated()
    }

    /// Start the engine with overlays visible and reset every target
    pub async fn begin(&mut self, engine: &mut GazeEngineAdapter) -> TrackerResult<EngineReadiness> {
        self.state.begin()?;

        let readiness = engine.start().await;
        engine.set_overlays(true, true);
        if self.probe_listener.is_none() {
            self.probe_listener = Some(engine.on_gaze_sample(self.probe.listener()));
        }

        tracing::info!("Calibration started (engine ready: {})", readiness.is_ready());
        Ok(readiness)
    }

    /// Count a click on `target`; the position reaches the engine only when
    /// the click was counted
    pub fn click_target(
        &mut self,
        engine: &mut GazeEngineAdapter,
        target: CalibrationTarget,
        x: f64,
        y: f64,
    ) -> ClickOutcome {
        let outcome = self.state.click(target);
        if outcome.was_counted() {
            engine.record_calibration_click(x, y);
        }

        match outcome {
            ClickOutcome::TargetCompleted { completed } => {
                tracing::debug!("Calibration target {} complete ({}/9)", target.name(), completed);
            }
            ClickOutcome::AllCompleted => {
                tracing::info!("All calibration targets complete, measuring accuracy");
            }
            _ => {}
        }
        outcome
    }

    /// Hold still for the measurement window, then score the stored samples.
    ///
    /// Gaze capture keeps running while this waits. Missing data never fails
    /// the flow: it yields `AccuracyOutcome::Undetermined`. Callers that share
    /// the controller behind a lock use `open_measurement` and
    /// `close_measurement` directly and wait between them unlocked.
    pub async fn measure_accuracy(
        &mut self,
        engine: &GazeEngineAdapter,
        viewport_width: u32,
        viewport_height: u32,
    ) -> TrackerResult<AccuracyOutcome> {
        let window = self.open_measurement()?;
        tokio::time::sleep(window).await;
        self.close_measurement(engine, viewport_width, viewport_height)
    }

    /// Freeze pointer input and start storing probe samples. Returns how long
    /// the caller should wait before `close_measurement`.
    pub fn open_measurement(&mut self) -> TrackerResult<Duration> {
        self.ensure_measuring()?;
        if self.is_input_frozen() {
            return Err(TrackerError::InvalidTransition(
                "accuracy measurement already in progress".to_string(),
            ));
        }

        self.input_frozen.store(true, Ordering::SeqCst);
        self.probe.start_storing();
        tracing::debug!("Measurement window open for {:?}", self.measurement_window);
        Ok(self.measurement_window)
    }

    /// Unfreeze input and score what the probe stored during the window
    pub fn close_measurement(
        &mut self,
        engine: &GazeEngineAdapter,
        viewport_width: u32,
        viewport_height: u32,
    ) -> TrackerResult<AccuracyOutcome> {
        self.ensure_measuring()?;
        if !self.is_input_frozen() {
            return Err(TrackerError::InvalidTransition(
                "no accuracy measurement in progress".to_string(),
            ));
        }

        self.probe.stop_storing();
        self.input_frozen.store(false, Ordering::SeqCst);

        let outcome = if !engine.is_ready() {
            AccuracyOutcome::Undetermined {
                reason: "gaze engine not ready".to_string(),
            }
        } else {
            match compute_accuracy(&self.probe.stored(), viewport_width, viewport_height) {
                Ok(percent) => AccuracyOutcome::Measured(percent),
                Err(e) => {
                    tracing::warn!("Accuracy could not be measured: {}", e);
                    AccuracyOutcome::Undetermined {
                        reason: e.to_string(),
                    }
                }
            }
        };

        if let Some(engine_accuracy) = engine.accuracy() {
            tracing::debug!("Engine-reported accuracy: {:.2}", engine_accuracy);
        }
        tracing::info!("Calibration accuracy: {}% ({:?})", outcome.score(), outcome);

        self.state.record_accuracy(outcome.clone())?;
        Ok(outcome)
    }

    fn ensure_measuring(&self) -> TrackerResult<()> {
        if self.state.phase() != &(CalibrationPhase::MeasuringAccuracy { outcome: None }) {
            return Err(TrackerError::InvalidTransition(format!(
                "accuracy measurement requested in {:?}",
                self.state.phase()
            )));
        }
        Ok(())
    }

    /// Keep the calibration: overlays off, tracking keeps running
    pub fn accept(&mut self, engine: &mut GazeEngineAdapter) -> TrackerResult<AccuracyOutcome> {
        let outcome = self.state.accept()?;

        engine.set_overlays(false, false);
        if let Some(id) = self.probe_listener.take() {
            engine.remove_gaze_listener(id);
        }
        self.settings.set_calibrated(true)?;

        tracing::info!("Calibration accepted at {}%", outcome.score());
        Ok(outcome)
    }

    /// Throw the result away and start the nine targets over
    pub fn recalibrate(&mut self) -> TrackerResult<()> {
        self.probe.stop_storing();
        self.input_frozen.store(false, Ordering::SeqCst);
        self.state.reject()?;
        tracing::info!("Recalibrating");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{FakeEngine, FakeEngineHandle};
    use crate::engine::EngineOptions;

    const WINDOW: Duration = Duration::from_millis(5_000);

    async fn setup() -> (CalibrationController, GazeEngineAdapter, FakeEngineHandle, Arc<SettingsStore>) {
        let (engine, handle) = FakeEngine::new();
        let adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());
        let settings = Arc::new(SettingsStore::in_memory());
        let controller = CalibrationController::new(settings.clone(), WINDOW);
        (controller, adapter, handle, settings)
    }

    fn complete_all(controller: &mut CalibrationController, adapter: &mut GazeEngineAdapter) {
        for target in CalibrationTarget::ALL {
            let (x, y) = target.position(1280, 800);
            for _ in 0..5 {
                controller.click_target(adapter, target, x, y);
            }
        }
    }

    fn spawn_emitter(handle: &FakeEngineHandle, x: f64, y: f64, count: i64) -> tokio::task::JoinHandle<()> {
        let handle = handle.clone();
        tokio::spawn(async move {
            for i in 0..count {
                tokio::time::sleep(Duration::from_millis(50)).await;
                handle.emit(x, y, i);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_turns_overlays_on() {
        let (mut controller, mut adapter, handle, _) = setup().await;

        let readiness = controller.begin(&mut adapter).await.unwrap();

        assert!(readiness.is_ready());
        assert_eq!(handle.overlays(), (true, true));
        assert_eq!(controller.phase(), &CalibrationPhase::Calibrating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counted_clicks_reach_engine() {
        let (mut controller, mut adapter, handle, _) = setup().await;
        controller.begin(&mut adapter).await.unwrap();

        for _ in 0..6 {
            controller.click_target(&mut adapter, CalibrationTarget::Pt1, 10.0, 20.0);
        }

        assert_eq!(handle.recorded_clicks().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_flow_measures_and_accepts() {
        let (mut controller, mut adapter, handle, settings) = setup().await;
        controller.begin(&mut adapter).await.unwrap();
        complete_all(&mut controller, &mut adapter);

        let emitter = spawn_emitter(&handle, 640.0, 400.0, 50);
        let outcome = controller.measure_accuracy(&adapter, 1280, 800).await.unwrap();
        emitter.await.unwrap();

        assert_eq!(outcome, AccuracyOutcome::Measured(100));
        assert!(!controller.is_input_frozen());

        controller.accept(&mut adapter).unwrap();
        assert_eq!(handle.overlays(), (false, false));
        assert!(settings.is_calibrated());
        assert!(handle.is_running());
        assert!(matches!(controller.phase(), CalibrationPhase::Done { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_few_samples_is_undetermined() {
        let (mut controller, mut adapter, handle, _) = setup().await;
        controller.begin(&mut adapter).await.unwrap();
        complete_all(&mut controller, &mut adapter);

        let emitter = spawn_emitter(&handle, 640.0, 400.0, 10);
        let outcome = controller.measure_accuracy(&adapter, 1280, 800).await.unwrap();
        emitter.await.unwrap();

        assert!(matches!(outcome, AccuracyOutcome::Undetermined { .. }));
        assert_eq!(outcome.score(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_engine_still_allows_accept_and_recalibrate() {
        let settings = Arc::new(SettingsStore::in_memory());
        let mut controller = CalibrationController::new(settings, WINDOW);
        let mut adapter = GazeEngineAdapter::unavailable(EngineOptions::default());

        let readiness = controller.begin(&mut adapter).await.unwrap();
        assert!(!readiness.is_ready());
        complete_all(&mut controller, &mut adapter);

        let outcome = controller.measure_accuracy(&adapter, 1280, 800).await.unwrap();
        assert!(!outcome.is_measured());

        controller.recalibrate().unwrap();
        assert_eq!(controller.phase(), &CalibrationPhase::Calibrating);
        assert_eq!(controller.state().completed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_freezes_input_until_closed() {
        let (mut controller, mut adapter, handle, _) = setup().await;
        controller.begin(&mut adapter).await.unwrap();
        complete_all(&mut controller, &mut adapter);
        handle.set_accuracy(Some(0.87));

        let window = controller.open_measurement().unwrap();
        assert_eq!(window, WINDOW);
        assert!(controller.is_input_frozen());
        assert!(matches!(
            controller.open_measurement(),
            Err(TrackerError::InvalidTransition(_))
        ));

        for i in 0..50 {
            handle.emit(640.0, 400.0, i);
        }
        let outcome = controller.close_measurement(&adapter, 1280, 800).unwrap();

        assert_eq!(outcome, AccuracyOutcome::Measured(100));
        assert!(!controller.is_input_frozen());
        assert_eq!(adapter.accuracy(), Some(0.87));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_without_open_is_an_error() {
        let (mut controller, mut adapter, _, _) = setup().await;
        controller.begin(&mut adapter).await.unwrap();
        complete_all(&mut controller, &mut adapter);

        assert!(matches!(
            controller.close_measurement(&adapter, 1280, 800),
            Err(TrackerError::InvalidTransition(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_requires_completed_targets() {
        let (mut controller, mut adapter, _, _) = setup().await;
        controller.begin(&mut adapter).await.unwrap();

        let result = controller.measure_accuracy(&adapter, 1280, 800).await;
        assert!(matches!(result, Err(TrackerError::InvalidTransition(_))));
    }
}
