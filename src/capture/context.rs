//! Page context lookup
//!
//! The pipeline never reads routing or scroll state itself; the host keeps a
//! `PageContext` current and every sample copies a snapshot of it.

use super::types::PageSnapshot;
use parking_lot::RwLock;

/// Provides the current route, scroll offset and viewport size
pub trait PageContext: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

/// Host-updated page context shared with the capture pipeline
#[derive(Debug, Default)]
pub struct SharedPageContext {
    current: RwLock<PageSnapshot>,
}

impl SharedPageContext {
    pub fn new(initial: PageSnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Route change; scroll resets to the top like a fresh page load
    pub fn navigate(&self, page: impl Into<String>) {
        let mut current = self.current.write();
        current.page = page.into();
        current.scroll_x = 0.0;
        current.scroll_y = 0.0;
    }

    /// Returns `false` and keeps the previous offset if either value is not finite
    pub fn scroll_to(&self, scroll_x: f64, scroll_y: f64) -> bool {
        if !scroll_x.is_finite() || !scroll_y.is_finite() {
            tracing::warn!("Ignoring non-finite scroll offset ({}, {})", scroll_x, scroll_y);
            return false;
        }
        let mut current = self.current.write();
        current.scroll_x = scroll_x;
        current.scroll_y = scroll_y;
        true
    }

    pub fn resize(&self, width: u32, height: u32) {
        let mut current = self.current.write();
        current.viewport_width = width;
        current.viewport_height = height;
    }
}

impl PageContext for SharedPageContext {
    fn snapshot(&self) -> PageSnapshot {
        self.current.read().clone()
    }
}
