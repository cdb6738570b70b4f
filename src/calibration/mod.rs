//! Nine-point calibration and accuracy measurement

pub mod accuracy;
pub mod controller;
pub mod state;

pub use accuracy::{compute_accuracy, AccuracyOutcome, AccuracyProbe, ACCURACY_SAMPLE_COUNT};
pub use controller::CalibrationController;
pub use state::{
    CalibrationPhase, CalibrationState, CalibrationTarget, ClickOutcome, TargetVisual,
    CLICKS_PER_TARGET,
};
