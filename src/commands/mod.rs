//! Host command handlers
//!
//! Thin async wrappers the host UI calls. Each returns `Result<T, String>` so
//! errors can be shown to the user as-is.

pub mod heatmap;
pub mod session;

pub use heatmap::HeatmapState;
pub use session::TrackerState;
