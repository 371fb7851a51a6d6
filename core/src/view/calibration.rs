use crate::prelude::{CalibrationSeed, ThermalFrame};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// Minimum separation kept between the window bounds, in temperature units.
pub const CALIBRATION_EPSILON: f32 = 1.0;

/// Temperature window mapped onto the palette's `[0, 1]` domain. Always `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f32,
    pub max: f32,
}

impl CalibrationRange {
    /// Window for reported frame bounds; a flat frame gets a window of width epsilon.
    ///
    /// At magnitudes where epsilon is below f32 resolution the window is widened
    /// upward by at least one ulp so `min < max` still holds.
    pub fn from_bounds(min: f32, max: f32) -> Self {
        if max > min {
            return Self { min, max };
        }
        let half = CALIBRATION_EPSILON / 2.0;
        let (low, high) = (min - half, min + half);
        if high > low {
            return Self {
                min: low,
                max: high,
            };
        }
        let step = (min.abs() * 2.0 * f32::EPSILON).max(CALIBRATION_EPSILON);
        Self {
            min,
            max: min + step,
        }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

impl From<CalibrationRange> for CalibrationSeed {
    fn from(range: CalibrationRange) -> Self {
        CalibrationSeed {
            min_temp: range.min,
            max_temp: range.max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationMode {
    Auto,
    Manual,
}

/// Tracks the active calibration window for the displayed frame.
///
/// Manual bounds are not confined to the frame's native domain; only the
/// epsilon separation is enforced.
pub struct CalibrationController {
    mode: CalibrationMode,
    range: CalibrationRange,
    domain: CalibrationRange,
    logger: LogManager,
}

impl CalibrationController {
    pub fn new() -> Self {
        let domain = CalibrationRange {
            min: 0.0,
            max: 100.0,
        };
        Self {
            mode: CalibrationMode::Auto,
            range: domain,
            domain,
            logger: LogManager::new(),
        }
    }

    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    pub fn range(&self) -> CalibrationRange {
        self.range
    }

    /// Native bounds reported by the current frame.
    pub fn domain(&self) -> CalibrationRange {
        self.domain
    }

    /// Re-seeds for a newly displayed frame.
    ///
    /// A usable persisted seed puts the controller in manual mode; otherwise it
    /// falls back to the frame's reported bounds.
    pub fn on_frame(&mut self, frame: &ThermalFrame, seed: Option<CalibrationSeed>) {
        self.domain = CalibrationRange::from_bounds(frame.min_temp(), frame.max_temp());
        match seed.filter(seed_is_usable) {
            Some(seed) => {
                self.mode = CalibrationMode::Manual;
                self.range = CalibrationRange {
                    min: seed.min_temp,
                    max: seed.max_temp,
                };
            }
            None => {
                if let Some(seed) = seed {
                    self.logger.warn(&format!(
                        "ignoring unusable calibration seed [{}, {}]",
                        seed.min_temp, seed.max_temp
                    ));
                }
                self.mode = CalibrationMode::Auto;
                self.range = self.domain;
            }
        }
    }

    /// Returns whether the update was applied.
    pub fn set_min(&mut self, value: f32) -> bool {
        if !value.is_finite() || value >= self.range.max - CALIBRATION_EPSILON {
            return false;
        }
        self.range.min = value;
        self.mode = CalibrationMode::Manual;
        true
    }

    /// Returns whether the update was applied.
    pub fn set_max(&mut self, value: f32) -> bool {
        if !value.is_finite() || value <= self.range.min + CALIBRATION_EPSILON {
            return false;
        }
        self.range.max = value;
        self.mode = CalibrationMode::Manual;
        true
    }

    pub fn reset(&mut self) {
        self.mode = CalibrationMode::Auto;
        self.range = self.domain;
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_is_usable(seed: &CalibrationSeed) -> bool {
    seed.min_temp.is_finite() && seed.max_temp.is_finite() && seed.min_temp < seed.max_temp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(min: f32, max: f32) -> ThermalFrame {
        ThermalFrame::new(1, 2, min, max, vec![min, max]).unwrap()
    }

    #[test]
    fn new_frame_without_seed_uses_reported_bounds() {
        let mut calibration = CalibrationController::new();
        calibration.on_frame(&frame(18.5, 64.0), None);
        assert_eq!(calibration.mode(), CalibrationMode::Auto);
        assert_eq!(
            calibration.range(),
            CalibrationRange {
                min: 18.5,
                max: 64.0
            }
        );
    }

    #[test]
    fn persisted_seed_starts_in_manual_mode() {
        let mut calibration = CalibrationController::new();
        let seed = CalibrationSeed {
            min_temp: 25.0,
            max_temp: 40.0,
        };
        calibration.on_frame(&frame(18.5, 64.0), Some(seed));
        assert_eq!(calibration.mode(), CalibrationMode::Manual);
        assert_eq!(calibration.range().min, 25.0);
        assert_eq!(calibration.domain().max, 64.0);

        calibration.reset();
        assert_eq!(calibration.mode(), CalibrationMode::Auto);
        assert_eq!(calibration.range(), calibration.domain());
    }

    #[test]
    fn inverted_seed_falls_back_to_auto() {
        let mut calibration = CalibrationController::new();
        let seed = CalibrationSeed {
            min_temp: 50.0,
            max_temp: 10.0,
        };
        calibration.on_frame(&frame(0.0, 80.0), Some(seed));
        assert_eq!(calibration.mode(), CalibrationMode::Auto);
    }

    #[test]
    fn edits_closer_than_epsilon_are_rejected() {
        let mut calibration = CalibrationController::new();
        calibration.on_frame(&frame(0.0, 100.0), None);
        assert!(!calibration.set_min(99.5));
        assert!(!calibration.set_min(99.0));
        assert!(calibration.set_min(98.5));
        assert!(!calibration.set_max(99.0));
        assert!(calibration.set_max(120.0));
        assert!(!calibration.set_max(f32::NAN));
        assert_eq!(
            calibration.range(),
            CalibrationRange {
                min: 98.5,
                max: 120.0
            }
        );
        assert_eq!(calibration.mode(), CalibrationMode::Manual);
    }

    #[test]
    fn min_stays_below_max_for_any_edit_sequence() {
        let mut calibration = CalibrationController::new();
        calibration.on_frame(&frame(-20.0, 60.0), None);
        let edits = [
            (true, 59.5),
            (false, -19.0),
            (true, 10.0),
            (false, 10.5),
            (false, 12.0),
            (true, 11.5),
            (true, -100.0),
            (false, -99.5),
            (false, 500.0),
            (true, 499.0),
        ];
        for (is_min, value) in edits {
            if is_min {
                calibration.set_min(value);
            } else {
                calibration.set_max(value);
            }
            let range = calibration.range();
            assert!(range.min < range.max, "{:?}", range);
        }
    }

    #[test]
    fn flat_frame_gets_non_degenerate_window() {
        let mut calibration = CalibrationController::new();
        calibration.on_frame(&frame(30.0, 30.0), None);
        let range = calibration.range();
        assert!(range.min < range.max);
        assert_eq!(range.span(), CALIBRATION_EPSILON);
    }

    #[test]
    fn flat_frame_at_large_magnitude_keeps_min_below_max() {
        let mut calibration = CalibrationController::new();
        let flat = ThermalFrame::from_samples(2, 1, vec![3.0e7, 3.0e7]).unwrap();
        calibration.on_frame(&flat, None);
        let range = calibration.range();
        assert!(range.min < range.max, "{:?}", range);
        assert_eq!(range.min, 3.0e7);
        assert_eq!(calibration.domain(), range);
    }
}
