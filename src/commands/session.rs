//! Tracking session commands

use crate::archive::SessionInfo;
use crate::calibration::{AccuracyOutcome, CalibrationTarget, TargetVisual};
use crate::capture::{LiveStats, PageContext, PageSnapshot, PointerEvent};
use crate::engine::EngineReadiness;
use crate::tracker::AttentionTracker;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared tracker handle for the command layer
pub struct TrackerState {
    pub tracker: Arc<Mutex<AttentionTracker>>,
}

impl TrackerState {
    pub fn new(tracker: AttentionTracker) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }
}

/// Host switched tracking on; returns whether capture is running
pub async fn start_tracking(state: &TrackerState) -> Result<bool, String> {
    let mut tracker = state.tracker.lock().await;
    tracker
        .start_session()
        .await
        .map_err(|e| format!("Failed to start session: {}", e))
}

/// Stop tracking and return the frozen session summary
pub async fn stop_tracking(state: &TrackerState) -> Result<SessionInfo, String> {
    let mut tracker = state.tracker.lock().await;
    let archive = tracker.stop_session().await;
    Ok(archive.session_info)
}

pub async fn mark_calibrated(state: &TrackerState) -> Result<bool, String> {
    let mut tracker = state.tracker.lock().await;
    tracker
        .mark_calibrated()
        .await
        .map_err(|e| format!("Failed to store calibration flag: {}", e))
}

pub async fn record_pointer(state: &TrackerState, x: f64, y: f64) -> Result<bool, String> {
    let tracker = state.tracker.lock().await;
    Ok(tracker.record_pointer(PointerEvent { x, y }))
}

/// Route, scroll or viewport changed in the host
pub async fn update_page_context(state: &TrackerState, snapshot: PageSnapshot) -> Result<(), String> {
    let tracker = state.tracker.lock().await;
    let context = tracker.page_context();
    if context.snapshot().page != snapshot.page {
        context.navigate(snapshot.page);
    }
    context.resize(snapshot.viewport_width, snapshot.viewport_height);
    if !context.scroll_to(snapshot.scroll_x, snapshot.scroll_y) {
        return Err(format!(
            "Invalid scroll offset ({}, {})",
            snapshot.scroll_x, snapshot.scroll_y
        ));
    }
    Ok(())
}

pub async fn get_live_stats(state: &TrackerState) -> Result<LiveStats, String> {
    let tracker = state.tracker.lock().await;
    Ok(tracker.live_stats())
}

/// Write the current session to disk; returns the file path
pub async fn export_session(state: &TrackerState, dir: Option<String>) -> Result<String, String> {
    let tracker = state.tracker.lock().await;
    let path = tracker
        .export_to(dir.as_deref().map(Path::new))
        .map_err(|e| format!("Failed to export session: {}", e))?;
    Ok(path.to_string_lossy().to_string())
}

pub async fn clear_session(state: &TrackerState) -> Result<(), String> {
    let tracker = state.tracker.lock().await;
    tracker.clear();
    Ok(())
}

pub async fn begin_calibration(state: &TrackerState) -> Result<bool, String> {
    let mut tracker = state.tracker.lock().await;
    let readiness = tracker
        .begin_calibration()
        .await
        .map_err(|e| format!("Failed to start calibration: {}", e))?;
    Ok(matches!(readiness, EngineReadiness::Ready))
}

/// Click on a calibration target by name (`Pt1`..`Pt9`); returns its new look
pub async fn click_calibration_target(
    state: &TrackerState,
    target: String,
    x: f64,
    y: f64,
) -> Result<TargetVisual, String> {
    let target = CalibrationTarget::from_name(&target)
        .ok_or_else(|| format!("Unknown calibration target: {}", target))?;

    let mut tracker = state.tracker.lock().await;
    tracker.click_calibration_target(target, x, y);
    Ok(tracker.calibration().state().target_visual(target))
}

/// Runs the full measurement window before returning. The tracker stays
/// unlocked while waiting, so pointer events (dropped while frozen), stats
/// and stop keep working.
pub async fn measure_accuracy(
    state: &TrackerState,
    viewport_width: u32,
    viewport_height: u32,
) -> Result<AccuracyOutcome, String> {
    let window = {
        let mut tracker = state.tracker.lock().await;
        tracker.open_accuracy_window().map_err(|e| e.to_string())?
    };

    tokio::time::sleep(window).await;

    let mut tracker = state.tracker.lock().await;
    tracker
        .close_accuracy_window(viewport_width, viewport_height)
        .map_err(|e| e.to_string())
}

pub async fn accept_calibration(state: &TrackerState) -> Result<AccuracyOutcome, String> {
    let mut tracker = state.tracker.lock().await;
    tracker.accept_calibration().await.map_err(|e| e.to_string())
}

pub async fn recalibrate(state: &TrackerState) -> Result<(), String> {
    let mut tracker = state.tracker.lock().await;
    tracker.recalibrate().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TrackerConfig;
    use crate::engine::fake::{FakeEngine, FakeEngineHandle};
    use std::time::Duration;
    use crate::engine::{EngineOptions, GazeEngineAdapter};
    use crate::settings::SettingsStore;

    fn state() -> TrackerState {
        state_with_engine().0
    }

    fn state_with_engine() -> (TrackerState, FakeEngineHandle) {
        let (engine, handle) = FakeEngine::new();
        let adapter = GazeEngineAdapter::new(Box::new(engine), EngineOptions::default());
        let tracker = AttentionTracker::new(
            TrackerConfig::default(),
            adapter,
            Arc::new(SettingsStore::in_memory()),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();
        (TrackerState::new(tracker), handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_is_tagged_with_updated_context() {
        let state = state();
        start_tracking(&state).await.unwrap();
        mark_calibrated(&state).await.unwrap();

        update_page_context(
            &state,
            PageSnapshot {
                page: "/checkout".to_string(),
                scroll_x: 0.0,
                scroll_y: 120.0,
                viewport_width: 1024,
                viewport_height: 768,
            },
        )
        .await
        .unwrap();
        assert!(record_pointer(&state, 10.0, 10.0).await.unwrap());

        let stats = get_live_stats(&state).await.unwrap();
        assert_eq!(stats.pages_visited, vec!["/checkout".to_string()]);

        let info = stop_tracking(&state).await.unwrap();
        assert_eq!(info.total_mouse_points, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_target_is_rejected() {
        let state = state();
        begin_calibration(&state).await.unwrap();

        let err = click_calibration_target(&state, "Pt42".to_string(), 0.0, 0.0)
            .await
            .unwrap_err();
        assert!(err.contains("Pt42"));

        let visual = click_calibration_target(&state, "Pt1".to_string(), 0.0, 0.0)
            .await
            .unwrap();
        assert_eq!(visual.clicks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_without_measurement_is_an_error() {
        let state = state();
        begin_calibration(&state).await.unwrap();
        assert!(accept_calibration(&state).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_stay_responsive_during_measurement() {
        let (state, engine) = state_with_engine();
        let state = Arc::new(state);
        start_tracking(&state).await.unwrap();
        mark_calibrated(&state).await.unwrap();

        begin_calibration(&state).await.unwrap();
        for target in CalibrationTarget::ALL {
            let (x, y) = target.position(1280, 800);
            for _ in 0..5 {
                click_calibration_target(&state, target.name().to_string(), x, y)
                    .await
                    .unwrap();
            }
        }

        let measuring = {
            let state = state.clone();
            tokio::spawn(async move { measure_accuracy(&state, 1280, 800).await })
        };
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let pointer = tokio::time::timeout(Duration::from_millis(100), record_pointer(&state, 5.0, 5.0))
            .await
            .unwrap();
        assert_eq!(pointer, Ok(false));

        engine.emit(640.0, 400.0, 1);
        let stats = tokio::time::timeout(Duration::from_millis(100), get_live_stats(&state))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.gaze_count, 1);
        assert_eq!(stats.mouse_count, 0);

        let info = tokio::time::timeout(Duration::from_millis(100), stop_tracking(&state))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.total_gaze_points, 1);

        let outcome = measuring.await.unwrap().unwrap();
        assert!(!outcome.is_measured());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_scroll_is_rejected() {
        let state = state();
        let snapshot = PageSnapshot {
            page: "/article".to_string(),
            scroll_x: 0.0,
            scroll_y: f64::NAN,
            viewport_width: 1280,
            viewport_height: 800,
        };

        let err = update_page_context(&state, snapshot).await.unwrap_err();
        assert!(err.contains("scroll"));

        let tracker = state.tracker.lock().await;
        assert_eq!(tracker.page_context().snapshot().scroll_y, 0.0);
    }
}
