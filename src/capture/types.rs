use serde::{Deserialize, Serialize};

/// Source of a tracking point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointKind {
    Gaze,
    #[serde(rename = "mouse", alias = "pointer")]
    Pointer,
}

/// Route, scroll offset and viewport size at the moment a sample is taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub page: String,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for PageSnapshot {
    fn default() -> Self {
        Self {
            page: "/".to_string(),
            scroll_x: 0.0,
            scroll_y: 0.0,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// One observation in viewport coordinates, with page and scroll context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPoint {
    pub x: f64,
    pub y: f64,
    /// Unix time in milliseconds
    pub timestamp: i64,
    #[serde(rename = "type", alias = "kind")]
    pub kind: PointKind,
    pub page: String,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Always `x + scroll_x` at capture time
    pub absolute_x: f64,
    /// Always `y + scroll_y` at capture time
    pub absolute_y: f64,
}

impl TrackingPoint {
    pub fn new(x: f64, y: f64, timestamp: i64, kind: PointKind, context: &PageSnapshot) -> Self {
        Self {
            x,
            y,
            timestamp,
            kind,
            page: context.page.clone(),
            scroll_x: context.scroll_x,
            scroll_y: context.scroll_y,
            viewport_width: context.viewport_width,
            viewport_height: context.viewport_height,
            absolute_x: x + context.scroll_x,
            absolute_y: y + context.scroll_y,
        }
    }

    /// Both viewport and page-absolute coordinates are finite
    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.absolute_x.is_finite()
            && self.absolute_y.is_finite()
    }
}

/// Raw pointer-move event forwarded by the host, in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

/// Counts reported to the host while a session runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub gaze_count: usize,
    pub mouse_count: usize,
    pub pages_visited: Vec<String>,
    pub duration_secs: u64,
}
