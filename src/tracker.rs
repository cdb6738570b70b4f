//! Host-facing tracking session
//!
//! `AttentionTracker` wires the engine adapter, calibration controller and
//! capture pipeline together and follows the host's two flags: the session is
//! active, and the visitor is calibrated. Capture runs only while both hold.

use crate::archive::{self, SessionArchive};
use crate::calibration::{AccuracyOutcome, CalibrationController, CalibrationTarget, ClickOutcome};
use crate::capture::{LiveStats, PointCapturePipeline, PointerEvent, SharedPageContext};
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::engine::{EngineReadiness, GazeEngineAdapter};
use crate::error::TrackerResult;
use crate::settings::SettingsStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use uuid::Uuid;

pub struct AttentionTracker {
    config: TrackerConfig,
    engine: GazeEngineAdapter,
    calibration: CalibrationController,
    pipeline: Arc<PointCapturePipeline>,
    context: Arc<SharedPageContext>,
    clock: Arc<dyn Clock>,
    settings: Arc<SettingsStore>,
    session_id: Option<Uuid>,
    active: bool,
    stats_tx: Arc<watch::Sender<LiveStats>>,
    ticker: Option<JoinHandle<()>>,
}

impl AttentionTracker {
    pub fn new(
        config: TrackerConfig,
        mut engine: GazeEngineAdapter,
        settings: Arc<SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> TrackerResult<Self> {
        config.validate()?;
        engine.configure(config.engine.clone());

        let context = Arc::new(SharedPageContext::default());
        let pipeline = Arc::new(PointCapturePipeline::new(
            &config,
            context.clone(),
            clock.clone(),
        ));
        let calibration = CalibrationController::new(
            settings.clone(),
            Duration::from_millis(config.measurement_window_ms),
        );
        let (stats_tx, _) = watch::channel(LiveStats::default());

        Ok(Self {
            config,
            engine,
            calibration,
            pipeline,
            context,
            clock,
            settings,
            session_id: None,
            active: false,
            stats_tx: Arc::new(stats_tx),
            ticker: None,
        })
    }

    /// Page context the host keeps current on navigation, scroll and resize
    pub fn page_context(&self) -> Arc<SharedPageContext> {
        self.context.clone()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn engine(&self) -> &GazeEngineAdapter {
        &self.engine
    }

    pub fn calibration(&self) -> &CalibrationController {
        &self.calibration
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_tracking(&self) -> bool {
        self.pipeline.is_capturing()
    }

    pub fn is_calibrated(&self) -> bool {
        self.settings.is_calibrated()
    }

    /// Host switched tracking on. Capture begins now if the visitor is
    /// already calibrated, otherwise once `mark_calibrated` is called.
    pub async fn start_session(&mut self) -> TrackerResult<bool> {
        if self.active {
            return Ok(self.is_tracking());
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.active = true;
        self.clear();
        tracing::info!("Session {} started", session_id);

        if self.settings.is_calibrated() {
            self.begin_tracking().await;
        } else {
            tracing::info!("Session {} waiting for calibration", session_id);
        }
        Ok(self.is_tracking())
    }

    /// Host reports calibration complete
    pub async fn mark_calibrated(&mut self) -> TrackerResult<bool> {
        self.settings.set_calibrated(true)?;
        if self.active {
            self.begin_tracking().await;
        }
        Ok(self.is_tracking())
    }

    async fn begin_tracking(&mut self) -> EngineReadiness {
        let readiness = self.engine.start().await;
        if self.pipeline.start_capture(&mut self.engine) {
            self.spawn_ticker();
        }
        readiness
    }

    /// Stop capture, pause the engine and return the final archive. The
    /// buffers keep this session until the next `start_session`.
    pub async fn stop_session(&mut self) -> SessionArchive {
        let archive = self.pipeline.stop_capture(&mut self.engine);

        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        self.stats_tx.send_replace(self.pipeline.live_stats());

        self.engine.pause();
        // Each session calibrates anew
        if let Err(e) = self.settings.set_calibrated(false) {
            tracing::warn!("Failed to reset calibration flag: {}", e);
        }
        if let Some(session_id) = self.session_id.take() {
            tracing::info!(
                "Session {} stopped after {}s",
                session_id,
                archive.session_info.duration
            );
        }
        self.active = false;
        archive
    }

    /// Host forwards every raw pointer move here
    pub fn record_pointer(&self, event: PointerEvent) -> bool {
        if self.calibration.is_input_frozen() {
            return false;
        }
        self.pipeline.record_pointer(event)
    }

    pub fn live_stats(&self) -> LiveStats {
        self.pipeline.live_stats()
    }

    /// Receiver updated on every stats tick
    pub fn subscribe_stats(&self) -> watch::Receiver<LiveStats> {
        self.stats_tx.subscribe()
    }

    pub fn export(&self) -> SessionArchive {
        self.pipeline.export()
    }

    /// Write the current archive to `dir`, or the configured export
    /// directory, or the working directory
    pub fn export_to(&self, dir: Option<&Path>) -> TrackerResult<PathBuf> {
        let dir = dir
            .map(Path::to_path_buf)
            .or_else(|| self.config.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        archive::write_archive(&dir, &self.pipeline.export(), self.clock.now_ms())
    }

    /// Parse an archive file for replay; live capture state is never touched
    pub fn import_from(&self, path: &Path) -> TrackerResult<SessionArchive> {
        archive::read_archive(path)
    }

    pub fn clear(&self) {
        self.pipeline.clear();
        self.stats_tx.send_replace(self.pipeline.live_stats());
    }

    pub async fn begin_calibration(&mut self) -> TrackerResult<EngineReadiness> {
        self.calibration.begin(&mut self.engine).await
    }

    pub fn click_calibration_target(
        &mut self,
        target: CalibrationTarget,
        x: f64,
        y: f64,
    ) -> ClickOutcome {
        self.calibration.click_target(&mut self.engine, target, x, y)
    }

    pub async fn measure_accuracy(
        &mut self,
        viewport_width: u32,
        viewport_height: u32,
    ) -> TrackerResult<AccuracyOutcome> {
        self.calibration
            .measure_accuracy(&self.engine, viewport_width, viewport_height)
            .await
    }

    /// Freeze pointer input for the measurement window; returns its length
    pub fn open_accuracy_window(&mut self) -> TrackerResult<Duration> {
        self.calibration.open_measurement()
    }

    pub fn close_accuracy_window(
        &mut self,
        viewport_width: u32,
        viewport_height: u32,
    ) -> TrackerResult<AccuracyOutcome> {
        self.calibration
            .close_measurement(&self.engine, viewport_width, viewport_height)
    }

    /// Accept the measured accuracy; tracking starts if the session is active
    pub async fn accept_calibration(&mut self) -> TrackerResult<AccuracyOutcome> {
        let outcome = self.calibration.accept(&mut self.engine)?;
        if self.active {
            self.begin_tracking().await;
        }
        Ok(outcome)
    }

    pub fn recalibrate(&mut self) -> TrackerResult<()> {
        self.calibration.recalibrate()
    }

    fn spawn_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }

        let pipeline = self.pipeline.clone();
        let stats_tx = self.stats_tx.clone();
        let period = Duration::from_millis(self.config.stats_interval_ms);

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            loop {
                interval.tick().await;
                if !pipeline.is_capturing() {
                    break;
                }
                let stats = pipeline.live_stats();
                tracing::trace!(
                    "Stats: gaze={} mouse={} duration={}s",
                    stats.gaze_count,
                    stats.mouse_count,
                    stats.duration_secs
                );
                stats_tx.send_replace(stats);
            }
        }));
    }
}

impl Drop for AttentionTracker {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}
