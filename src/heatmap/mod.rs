//! Heatmap replay
//!
//! Turns a session archive back into a per-page overlay: points are filtered
//! to the selected page, mapped from document to viewport coordinates with the
//! current scroll offset, and splatted onto a canvas.

pub mod canvas;
pub mod gradient;
pub mod renderer;

pub use canvas::{Canvas, RasterCanvas};
pub use gradient::{Gradient, GAZE_RADIUS, MOUSE_RADIUS};
pub use renderer::{
    points_for_page, screen_position, HeatmapFilters, HeatmapRenderer, HeatmapViewer,
    RenderOutcome, RenderStats, ScrollOffset,
};
