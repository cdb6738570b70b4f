//! Heatmap replay commands

use crate::heatmap::{HeatmapFilters, HeatmapViewer, RenderOutcome};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default overlay size until the host reports its viewport
const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);

pub struct HeatmapState {
    pub viewer: Arc<Mutex<HeatmapViewer>>,
}

impl Default for HeatmapState {
    fn default() -> Self {
        Self {
            viewer: Arc::new(Mutex::new(HeatmapViewer::with_size(
                DEFAULT_VIEWPORT.0,
                DEFAULT_VIEWPORT.1,
            ))),
        }
    }
}

/// Load an archive file chosen by the user
pub async fn load_heatmap_file(state: &HeatmapState, path: String) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    viewer
        .load_file(Path::new(&path))
        .map_err(|e| format!("Failed to load session data: {}", e))
}

/// Load archive contents uploaded by the host
pub async fn load_heatmap_bytes(state: &HeatmapState, data: Vec<u8>) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    viewer
        .load_bytes(&data)
        .map_err(|e| format!("Failed to load session data. Please check the file format. ({})", e))
}

pub async fn get_heatmap_pages(state: &HeatmapState) -> Result<Vec<String>, String> {
    let viewer = state.viewer.lock().await;
    Ok(viewer.pages().to_vec())
}

pub async fn select_heatmap_page(state: &HeatmapState, page: String) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    Ok(viewer.select_page(page))
}

pub async fn set_heatmap_filters(
    state: &HeatmapState,
    filters: HeatmapFilters,
) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    Ok(viewer.set_filters(filters))
}

pub async fn scroll_heatmap(state: &HeatmapState, x: f64, y: f64) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    Ok(viewer.scroll_to(x, y))
}

pub async fn resize_heatmap(
    state: &HeatmapState,
    width: u32,
    height: u32,
) -> Result<RenderOutcome, String> {
    let mut viewer = state.viewer.lock().await;
    Ok(viewer.resize(width, height))
}

/// Write the current overlay to a PNG file
pub async fn save_heatmap_png(state: &HeatmapState, path: String) -> Result<(), String> {
    let viewer = state.viewer.lock().await;
    viewer
        .canvas()
        .save_png(Path::new(&path))
        .map_err(|e| e.to_string())
}

pub async fn close_heatmap(state: &HeatmapState) -> Result<(), String> {
    let mut viewer = state.viewer.lock().await;
    viewer.unload();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{to_json_bytes, SessionArchive};
    use crate::capture::{PageSnapshot, PointKind, TrackingPoint};

    fn archive_bytes() -> Vec<u8> {
        let context = PageSnapshot {
            page: "/home".to_string(),
            ..PageSnapshot::default()
        };
        let gaze = vec![TrackingPoint::new(300.0, 200.0, 1, PointKind::Gaze, &context)];
        let archive = SessionArchive::from_buffers(gaze, vec![], vec!["/home".into()], 0, 5_000);
        to_json_bytes(&archive).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_list_pages() {
        let state = HeatmapState::default();
        let outcome = load_heatmap_bytes(&state, archive_bytes()).await.unwrap();

        assert!(matches!(outcome, RenderOutcome::Rendered(_)));
        assert_eq!(get_heatmap_pages(&state).await.unwrap(), vec!["/home".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_upload_reports_format_error() {
        let state = HeatmapState::default();
        let err = load_heatmap_bytes(&state, b"[]".to_vec()).await.unwrap_err();
        assert!(err.contains("file format"));
    }

    #[tokio::test]
    async fn test_close_requires_reload() {
        let state = HeatmapState::default();
        load_heatmap_bytes(&state, archive_bytes()).await.unwrap();
        close_heatmap(&state).await.unwrap();

        let outcome = select_heatmap_page(&state, "/home".to_string()).await.unwrap();
        assert_eq!(outcome, RenderOutcome::ArchiveRequired);
    }

    #[tokio::test]
    async fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.png");
        let state = HeatmapState::default();
        load_heatmap_bytes(&state, archive_bytes()).await.unwrap();

        save_heatmap_png(&state, path.to_string_lossy().to_string())
            .await
            .unwrap();
        assert!(path.exists());
    }
}
