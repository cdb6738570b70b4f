use super::accuracy::AccuracyOutcome;
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};

/// Clicks needed before a target counts as complete
pub const CLICKS_PER_TARGET: u8 = 5;

/// Nine fixed on-screen calibration points, row by row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationTarget {
    Pt1,
    Pt2,
    Pt3,
    Pt4,
    Pt5,
    Pt6,
    Pt7,
    Pt8,
    Pt9,
}

impl CalibrationTarget {
    pub const ALL: [CalibrationTarget; 9] = [
        CalibrationTarget::Pt1,
        CalibrationTarget::Pt2,
        CalibrationTarget::Pt3,
        CalibrationTarget::Pt4,
        CalibrationTarget::Pt5,
        CalibrationTarget::Pt6,
        CalibrationTarget::Pt7,
        CalibrationTarget::Pt8,
        CalibrationTarget::Pt9,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            CalibrationTarget::Pt1 => "Pt1",
            CalibrationTarget::Pt2 => "Pt2",
            CalibrationTarget::Pt3 => "Pt3",
            CalibrationTarget::Pt4 => "Pt4",
            CalibrationTarget::Pt5 => "Pt5",
            CalibrationTarget::Pt6 => "Pt6",
            CalibrationTarget::Pt7 => "Pt7",
            CalibrationTarget::Pt8 => "Pt8",
            CalibrationTarget::Pt9 => "Pt9",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|target| target.name() == name)
    }

    /// Centre of the target in viewport pixels. Columns and rows sit at
    /// 10%, 50% and 90% of the viewport, so `Pt5` is the exact centre.
    pub fn position(self, viewport_width: u32, viewport_height: u32) -> (f64, f64) {
        const FRACTIONS: [f64; 3] = [0.1, 0.5, 0.9];
        let column = self.index() % 3;
        let row = self.index() / 3;
        (
            viewport_width as f64 * FRACTIONS[column],
            viewport_height as f64 * FRACTIONS[row],
        )
    }
}

/// How a target should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetVisual {
    pub clicks: u8,
    /// `min(1, 0.2 * clicks + 0.2)`
    pub opacity: f64,
    pub complete: bool,
    /// The centre target is held back until the other eight are done
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationPhase {
    Idle,
    Calibrating,
    /// `outcome` is `None` while the measurement window is still open
    MeasuringAccuracy { outcome: Option<AccuracyOutcome> },
    Done { outcome: AccuracyOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Target already complete, or not calibrating
    Ignored,
    Counted { clicks: u8 },
    TargetCompleted { completed: usize },
    /// Ninth target completed; accuracy measurement begins
    AllCompleted,
}

impl ClickOutcome {
    pub fn was_counted(self) -> bool {
        !matches!(self, ClickOutcome::Ignored)
    }
}

/// Nine-point calibration state machine
#[derive(Debug, Clone)]
pub struct CalibrationState {
    counts: [u8; 9],
    phase: CalibrationPhase,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationState {
    pub fn new() -> Self {
        Self {
            counts: [0; 9],
            phase: CalibrationPhase::Idle,
        }
    }

    pub fn phase(&self) -> &CalibrationPhase {
        &self.phase
    }

    pub fn clicks(&self, target: CalibrationTarget) -> u8 {
        self.counts[target.index()]
    }

    pub fn completed_count(&self) -> usize {
        self.counts
            .iter()
            .filter(|&&count| count >= CLICKS_PER_TARGET)
            .count()
    }

    /// Enter `Calibrating` with all counters at zero
    pub fn begin(&mut self) -> TrackerResult<()> {
        match self.phase {
            CalibrationPhase::Idle | CalibrationPhase::Done { .. } => {
                self.counts = [0; 9];
                self.phase = CalibrationPhase::Calibrating;
                Ok(())
            }
            CalibrationPhase::Calibrating => Ok(()),
            CalibrationPhase::MeasuringAccuracy { .. } => Err(TrackerError::InvalidTransition(
                "cannot restart calibration while accuracy is being measured".to_string(),
            )),
        }
    }

    pub fn click(&mut self, target: CalibrationTarget) -> ClickOutcome {
        if self.phase != CalibrationPhase::Calibrating {
            return ClickOutcome::Ignored;
        }

        let count = &mut self.counts[target.index()];
        if *count >= CLICKS_PER_TARGET {
            return ClickOutcome::Ignored;
        }
        *count += 1;
        let clicks = *count;

        if clicks < CLICKS_PER_TARGET {
            return ClickOutcome::Counted { clicks };
        }

        let completed = self.completed_count();
        if completed == CalibrationTarget::ALL.len() {
            self.phase = CalibrationPhase::MeasuringAccuracy { outcome: None };
            ClickOutcome::AllCompleted
        } else {
            ClickOutcome::TargetCompleted { completed }
        }
    }

    pub fn target_visual(&self, target: CalibrationTarget) -> TargetVisual {
        let clicks = self.clicks(target);
        let visible = target != CalibrationTarget::Pt5 || self.completed_count() >= 8;
        TargetVisual {
            clicks,
            opacity: (0.2 * clicks as f64 + 0.2).min(1.0),
            complete: clicks >= CLICKS_PER_TARGET,
            visible,
        }
    }

    /// Store the result of the measurement window
    pub fn record_accuracy(&mut self, outcome: AccuracyOutcome) -> TrackerResult<()> {
        match self.phase {
            CalibrationPhase::MeasuringAccuracy { outcome: None } => {
                self.phase = CalibrationPhase::MeasuringAccuracy {
                    outcome: Some(outcome),
                };
                Ok(())
            }
            _ => Err(TrackerError::InvalidTransition(format!(
                "no accuracy measurement pending in {:?}",
                self.phase
            ))),
        }
    }

    /// User accepted the measured accuracy
    pub fn accept(&mut self) -> TrackerResult<AccuracyOutcome> {
        match &self.phase {
            CalibrationPhase::MeasuringAccuracy {
                outcome: Some(outcome),
            } => {
                let outcome = outcome.clone();
                self.phase = CalibrationPhase::Done {
                    outcome: outcome.clone(),
                };
                Ok(outcome)
            }
            other => Err(TrackerError::InvalidTransition(format!(
                "cannot accept calibration in {:?}",
                other
            ))),
        }
    }

    /// User rejected the result; every counter goes back to zero
    pub fn reject(&mut self) -> TrackerResult<()> {
        match self.phase {
            CalibrationPhase::Idle => Err(TrackerError::InvalidTransition(
                "calibration has not started".to_string(),
            )),
            _ => {
                self.counts = [0; 9];
                self.phase = CalibrationPhase::Calibrating;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrating() -> CalibrationState {
        let mut state = CalibrationState::new();
        state.begin().unwrap();
        state
    }

    #[test]
    fn test_begin_initializes_counters() {
        let state = calibrating();
        assert_eq!(state.phase(), &CalibrationPhase::Calibrating);
        assert!(CalibrationTarget::ALL.iter().all(|&t| state.clicks(t) == 0));
    }

    #[test]
    fn test_45_clicks_enter_measuring_exactly_once() {
        let mut state = calibrating();
        let mut all_completed = 0;

        // Interleaved order: one click per target per round
        for _round in 0..CLICKS_PER_TARGET {
            for target in CalibrationTarget::ALL.iter().rev() {
                if state.click(*target) == ClickOutcome::AllCompleted {
                    all_completed += 1;
                }
            }
        }

        assert_eq!(all_completed, 1);
        assert_eq!(state.completed_count(), 9);
        assert_eq!(
            state.phase(),
            &CalibrationPhase::MeasuringAccuracy { outcome: None }
        );
    }

    #[test]
    fn test_sixth_click_is_noop() {
        let mut state = calibrating();
        for _ in 0..5 {
            state.click(CalibrationTarget::Pt3);
        }
        assert_eq!(state.click(CalibrationTarget::Pt3), ClickOutcome::Ignored);
        assert_eq!(state.clicks(CalibrationTarget::Pt3), 5);
        assert_eq!(state.completed_count(), 1);
    }

    #[test]
    fn test_click_outcomes() {
        let mut state = calibrating();
        assert_eq!(
            state.click(CalibrationTarget::Pt1),
            ClickOutcome::Counted { clicks: 1 }
        );
        for _ in 0..3 {
            state.click(CalibrationTarget::Pt1);
        }
        assert_eq!(
            state.click(CalibrationTarget::Pt1),
            ClickOutcome::TargetCompleted { completed: 1 }
        );
    }

    #[test]
    fn test_clicks_ignored_when_idle() {
        let mut state = CalibrationState::new();
        assert_eq!(state.click(CalibrationTarget::Pt1), ClickOutcome::Ignored);
        assert_eq!(state.clicks(CalibrationTarget::Pt1), 0);
    }

    #[test]
    fn test_visual_opacity_and_completion() {
        let mut state = calibrating();
        assert!((state.target_visual(CalibrationTarget::Pt2).opacity - 0.2).abs() < 1e-9);

        for _ in 0..2 {
            state.click(CalibrationTarget::Pt2);
        }
        let visual = state.target_visual(CalibrationTarget::Pt2);
        assert!((visual.opacity - 0.6).abs() < 1e-9);
        assert!(!visual.complete);

        for _ in 0..3 {
            state.click(CalibrationTarget::Pt2);
        }
        let visual = state.target_visual(CalibrationTarget::Pt2);
        assert_eq!(visual.opacity, 1.0);
        assert!(visual.complete);
    }

    #[test]
    fn test_centre_target_hidden_until_eight_done() {
        let mut state = calibrating();
        assert!(!state.target_visual(CalibrationTarget::Pt5).visible);

        for target in CalibrationTarget::ALL {
            if target == CalibrationTarget::Pt5 {
                continue;
            }
            for _ in 0..5 {
                state.click(target);
            }
        }
        assert!(state.target_visual(CalibrationTarget::Pt5).visible);
    }

    #[test]
    fn test_accept_requires_measurement() {
        let mut state = calibrating();
        assert!(matches!(
            state.accept(),
            Err(TrackerError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_reject_resets_counters() {
        let mut state = calibrating();
        for target in CalibrationTarget::ALL {
            for _ in 0..5 {
                state.click(target);
            }
        }
        state.record_accuracy(AccuracyOutcome::Measured(40)).unwrap();

        state.reject().unwrap();

        assert_eq!(state.phase(), &CalibrationPhase::Calibrating);
        assert_eq!(state.completed_count(), 0);
    }

    #[test]
    fn test_accept_moves_to_done() {
        let mut state = calibrating();
        for target in CalibrationTarget::ALL {
            for _ in 0..5 {
                state.click(target);
            }
        }
        state.record_accuracy(AccuracyOutcome::Measured(87)).unwrap();

        let outcome = state.accept().unwrap();
        assert_eq!(outcome, AccuracyOutcome::Measured(87));
        assert!(matches!(state.phase(), CalibrationPhase::Done { .. }));
    }

    #[test]
    fn test_target_positions() {
        assert_eq!(CalibrationTarget::Pt5.position(1000, 800), (500.0, 400.0));
        assert_eq!(CalibrationTarget::Pt1.position(1000, 800), (100.0, 80.0));
        assert_eq!(CalibrationTarget::Pt9.position(1000, 800), (900.0, 720.0));
        assert_eq!(CalibrationTarget::from_name("Pt7"), Some(CalibrationTarget::Pt7));
        assert_eq!(CalibrationTarget::from_name("Pt10"), None);
    }
}
