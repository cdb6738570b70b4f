//! Gaze and pointer capture
//!
//! Samples arrive from the gaze engine listener and from host pointer events,
//! are tagged with the current page context, and land in bounded buffers.

pub mod buffer;
pub mod context;
pub mod pipeline;
pub mod types;

pub use buffer::PointBuffer;
pub use context::{PageContext, SharedPageContext};
pub use pipeline::PointCapturePipeline;
pub use types::{LiveStats, PageSnapshot, PointKind, PointerEvent, TrackingPoint};
