//! Attention heatmap - gaze and pointer capture with per-page heatmap replay.
//!
//! This is the library crate: it samples gaze and pointer positions while a
//! visitor browses, stores them as a portable session archive, and renders
//! archives back into per-page heatmap overlays.

pub mod archive;
pub mod calibration;
pub mod capture;
pub mod clock;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod heatmap;
pub mod settings;
pub mod tracker;

pub use error::{TrackerError, TrackerResult};
pub use tracker::AttentionTracker;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attention_heatmap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
