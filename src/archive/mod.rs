//! Session archive: the portable unit of persistence and transfer
//!
//! An archive is an owned snapshot of both point buffers plus frozen session
//! metadata. Serialized as camelCase JSON:
//!
//! ```json
//! { "gazePoints": [...], "mousePoints": [...],
//!   "sessionInfo": { "startTime": 0, "endTime": 0, "duration": 0,
//!                    "totalGazePoints": 0, "totalMousePoints": 0,
//!                    "pagesVisited": ["/"] } }
//! ```

use crate::capture::types::TrackingPoint;
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name prefix for exported sessions
pub const EXPORT_PREFIX: &str = "webgazer-session-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Unix time in milliseconds
    pub start_time: i64,
    /// Unix time in milliseconds
    pub end_time: i64,
    /// Whole seconds between start and end
    pub duration: u64,
    pub total_gaze_points: usize,
    pub total_mouse_points: usize,
    pub pages_visited: Vec<String>,
}

impl SessionInfo {
    /// Derive session metadata from buffer contents at `end_time`
    pub fn freeze(
        start_time: i64,
        end_time: i64,
        gaze_points: &[TrackingPoint],
        mouse_points: &[TrackingPoint],
        pages_visited: Vec<String>,
    ) -> Self {
        Self {
            start_time,
            end_time,
            duration: duration_secs(start_time, end_time),
            total_gaze_points: gaze_points.len(),
            total_mouse_points: mouse_points.len(),
            pages_visited,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionArchive {
    pub gaze_points: Vec<TrackingPoint>,
    pub mouse_points: Vec<TrackingPoint>,
    pub session_info: SessionInfo,
}

impl SessionArchive {
    pub fn from_buffers(
        gaze_points: Vec<TrackingPoint>,
        mouse_points: Vec<TrackingPoint>,
        pages_visited: Vec<String>,
        start_time: i64,
        end_time: i64,
    ) -> Self {
        let session_info =
            SessionInfo::freeze(start_time, end_time, &gaze_points, &mouse_points, pages_visited);
        Self {
            gaze_points,
            mouse_points,
            session_info,
        }
    }

    pub fn has_pages(&self) -> bool {
        !self.session_info.pages_visited.is_empty()
    }

    /// Number of gaze and pointer points tagged with `page`
    pub fn counts_for_page(&self, page: &str) -> (usize, usize) {
        let gaze = self.gaze_points.iter().filter(|p| p.page == page).count();
        let mouse = self.mouse_points.iter().filter(|p| p.page == page).count();
        (gaze, mouse)
    }
}

/// Whole seconds between two millisecond timestamps, floored, never negative
pub fn duration_secs(start_ms: i64, end_ms: i64) -> u64 {
    (end_ms.saturating_sub(start_ms).max(0) / 1000) as u64
}

/// Serialize an archive for download
pub fn to_json_bytes(archive: &SessionArchive) -> TrackerResult<Vec<u8>> {
    serde_json::to_vec_pretty(archive).map_err(|e| {
        TrackerError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Parse an externally supplied archive. Nothing is returned unless the whole
/// document matches the expected shape.
pub fn from_json_slice(raw: &[u8]) -> TrackerResult<SessionArchive> {
    serde_json::from_slice(raw).map_err(|e| TrackerError::MalformedArchive(e.to_string()))
}

/// `webgazer-session-<epoch-ms>.json`
pub fn export_filename(epoch_ms: i64) -> String {
    format!("{}{}.json", EXPORT_PREFIX, epoch_ms)
}

/// Write an archive into `dir` using the export naming convention
pub fn write_archive(dir: &Path, archive: &SessionArchive, epoch_ms: i64) -> TrackerResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(epoch_ms));
    let data = to_json_bytes(archive)?;
    std::fs::write(&path, data)?;

    tracing::info!(
        "Exported session archive to {} (gaze={}, mouse={}, pages={})",
        path.display(),
        archive.session_info.total_gaze_points,
        archive.session_info.total_mouse_points,
        archive.session_info.pages_visited.len()
    );
    Ok(path)
}

pub fn read_archive(path: &Path) -> TrackerResult<SessionArchive> {
    let raw = std::fs::read(path)?;
    let archive = from_json_slice(&raw)?;

    tracing::info!(
        "Loaded session archive {} ({} gaze, {} mouse points)",
        path.display(),
        archive.gaze_points.len(),
        archive.mouse_points.len()
    );
    Ok(archive)
}
