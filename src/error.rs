//! Error taxonomy for the attention-tracking core
//!
//! Capture and render failures are contained where they happen and only
//! logged. Import/export failures are returned to the caller so the host can
//! show a message instead of silently losing a session.

use thiserror::Error;

/// Errors that can occur while tracking, calibrating, or replaying
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Gaze engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Malformed session archive: {0}")]
    MalformedArchive(String),

    #[error("Insufficient samples for accuracy measurement ({available} of {required})")]
    InsufficientSamples { available: usize, required: usize },

    #[error("Invalid calibration transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
