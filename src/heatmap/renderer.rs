use super::canvas::{Canvas, RasterCanvas};
use super::gradient::Gradient;
use crate::archive::{self, SessionArchive};
use crate::capture::types::TrackingPoint;
use crate::error::TrackerResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which point kinds are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapFilters {
    pub show_gaze: bool,
    pub show_mouse: bool,
}

impl Default for HeatmapFilters {
    fn default() -> Self {
        Self {
            show_gaze: true,
            show_mouse: true,
        }
    }
}

/// Current scroll offset of the page under the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStats {
    pub gaze_drawn: usize,
    pub mouse_drawn: usize,
    /// Points on the page whose splat fell entirely off-canvas
    pub culled: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "stats", rename_all = "camelCase")]
pub enum RenderOutcome {
    /// Nothing loaded yet; the host should offer to load an archive
    ArchiveRequired,
    /// Archive has no visited pages; canvas is left clear
    NoPagesVisited,
    Rendered(RenderStats),
}

/// Points captured on `page`, in capture order
pub fn points_for_page<'a>(
    points: &'a [TrackingPoint],
    page: &'a str,
) -> impl Iterator<Item = &'a TrackingPoint> + 'a {
    points.iter().filter(move |point| point.page == page)
}

/// Document position mapped back into the current viewport
pub fn screen_position(point: &TrackingPoint, scroll: ScrollOffset) -> (f64, f64) {
    (point.absolute_x - scroll.x, point.absolute_y - scroll.y)
}

/// Draws a session archive as per-page gaze and pointer splats
#[derive(Debug, Clone, Copy)]
pub struct HeatmapRenderer {
    gaze: Gradient,
    mouse: Gradient,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            gaze: Gradient::gaze(),
            mouse: Gradient::mouse(),
        }
    }
}

impl HeatmapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear `canvas` and draw every point recorded on `current_page`.
    /// Gaze splats go down first so pointer splats stay visible on top.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        archive: Option<&SessionArchive>,
        current_page: &str,
        filters: HeatmapFilters,
        scroll: ScrollOffset,
    ) -> RenderOutcome {
        let Some(archive) = archive else {
            return RenderOutcome::ArchiveRequired;
        };

        canvas.clear();
        if !archive.has_pages() {
            return RenderOutcome::NoPagesVisited;
        }

        let mut stats = RenderStats::default();

        if filters.show_gaze {
            for point in points_for_page(&archive.gaze_points, current_page) {
                let (x, y) = screen_position(point, scroll);
                if canvas.draw_splat(x, y, &self.gaze) {
                    stats.gaze_drawn += 1;
                } else {
                    stats.culled += 1;
                }
            }
        }

        if filters.show_mouse {
            for point in points_for_page(&archive.mouse_points, current_page) {
                let (x, y) = screen_position(point, scroll);
                if canvas.draw_splat(x, y, &self.mouse) {
                    stats.mouse_drawn += 1;
                } else {
                    stats.culled += 1;
                }
            }
        }

        tracing::debug!(
            "Drew {} gaze and {} mouse points for {} ({} off-screen)",
            stats.gaze_drawn,
            stats.mouse_drawn,
            current_page,
            stats.culled
        );
        RenderOutcome::Rendered(stats)
    }
}

/// Interactive replay state: loaded archive, selected page, filters, scroll
///
/// Every change redraws from the archive held in memory.
pub struct HeatmapViewer<C: Canvas = RasterCanvas> {
    renderer: HeatmapRenderer,
    canvas: C,
    archive: Option<SessionArchive>,
    current_page: String,
    filters: HeatmapFilters,
    scroll: ScrollOffset,
    last_outcome: RenderOutcome,
}

impl HeatmapViewer<RasterCanvas> {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(RasterCanvas::new(width, height))
    }
}

impl<C: Canvas> HeatmapViewer<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            renderer: HeatmapRenderer::new(),
            canvas,
            archive: None,
            current_page: "/".to_string(),
            filters: HeatmapFilters::default(),
            scroll: ScrollOffset::default(),
            last_outcome: RenderOutcome::ArchiveRequired,
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn archive(&self) -> Option<&SessionArchive> {
        self.archive.as_ref()
    }

    pub fn current_page(&self) -> &str {
        &self.current_page
    }

    pub fn filters(&self) -> HeatmapFilters {
        self.filters
    }

    pub fn last_outcome(&self) -> RenderOutcome {
        self.last_outcome
    }

    /// Pages available for selection, in first-visit order
    pub fn pages(&self) -> &[String] {
        self.archive
            .as_ref()
            .map(|archive| archive.session_info.pages_visited.as_slice())
            .unwrap_or(&[])
    }

    /// Show `archive`, starting on its first visited page
    pub fn load(&mut self, archive: SessionArchive) -> RenderOutcome {
        if let Some(first) = archive.session_info.pages_visited.first() {
            self.current_page = first.clone();
        }
        tracing::info!(
            "Heatmap loaded ({} gaze, {} mouse points, {} pages)",
            archive.gaze_points.len(),
            archive.mouse_points.len(),
            archive.session_info.pages_visited.len()
        );
        self.archive = Some(archive);
        self.redraw()
    }

    /// Load `archive` with page, filters and scroll already chosen, drawing
    /// once. `page` defaults to the first visited page.
    pub fn load_with_view(
        &mut self,
        archive: SessionArchive,
        page: Option<String>,
        filters: HeatmapFilters,
        scroll: ScrollOffset,
    ) -> RenderOutcome {
        self.current_page = page
            .or_else(|| archive.session_info.pages_visited.first().cloned())
            .unwrap_or_else(|| self.current_page.clone());
        self.filters = filters;
        self.scroll = scroll;
        self.archive = Some(archive);
        self.redraw()
    }

    /// Parse and show an uploaded archive. On failure the previously loaded
    /// archive stays on screen.
    pub fn load_bytes(&mut self, raw: &[u8]) -> TrackerResult<RenderOutcome> {
        let archive = archive::from_json_slice(raw).map_err(|e| {
            tracing::warn!("Rejected heatmap upload: {}", e);
            e
        })?;
        Ok(self.load(archive))
    }

    pub fn load_file(&mut self, path: &Path) -> TrackerResult<RenderOutcome> {
        let archive = archive::read_archive(path)?;
        Ok(self.load(archive))
    }

    /// Close the viewer and clear the overlay
    pub fn unload(&mut self) {
        self.archive = None;
        self.canvas.clear();
        self.last_outcome = RenderOutcome::ArchiveRequired;
    }

    pub fn select_page(&mut self, page: impl Into<String>) -> RenderOutcome {
        self.current_page = page.into();
        self.redraw()
    }

    pub fn set_filters(&mut self, filters: HeatmapFilters) -> RenderOutcome {
        self.filters = filters;
        self.redraw()
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) -> RenderOutcome {
        self.scroll = ScrollOffset { x, y };
        self.redraw()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> RenderOutcome {
        self.canvas.resize(width, height);
        self.redraw()
    }

    pub fn redraw(&mut self) -> RenderOutcome {
        self.last_outcome = self.renderer.render(
            &mut self.canvas,
            self.archive.as_ref(),
            &self.current_page,
            self.filters,
            self.scroll,
        );
        self.last_outcome
    }
}
