use crate::pipeline::errors::ScanError;
use crate::shared::constants::{DEFAULT_FRAME_INTERVAL_SECS, DEFAULT_MIN_CONFIDENCE};

/// Tuning for one scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanSettings {
    /// Minimum match confidence in [0, 1] for a face to count as a sighting.
    pub min_confidence: f64,
    /// Seconds of video between sampled frames.
    pub frame_interval_secs: f64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            frame_interval_secs: DEFAULT_FRAME_INTERVAL_SECS,
        }
    }
}

impl ScanSettings {
    pub fn validate(&self) -> Result<(), ScanError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ScanError::InvalidInput(format!(
                "min confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !self.frame_interval_secs.is_finite() || self.frame_interval_secs <= 0.0 {
            return Err(ScanError::InvalidInput(format!(
                "frame interval must be a positive number of seconds, got {}",
                self.frame_interval_secs
            )));
        }
        Ok(())
    }

    /// Frames between samples at `fps`. Halves round to even, never below 1.
    pub fn stride(&self, fps: f64) -> usize {
        let frames = (self.frame_interval_secs * fps).round_ties_even();
        if frames.is_finite() && frames >= 1.0 {
            frames as usize
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings(min_confidence: f64, frame_interval_secs: f64) -> ScanSettings {
        ScanSettings {
            min_confidence,
            frame_interval_secs,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let s = ScanSettings::default();
        assert_eq!(s.min_confidence, 0.6);
        assert_eq!(s.frame_interval_secs, 1.0);
        assert!(s.validate().is_ok());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_rejects_non_positive_interval(#[case] interval: f64) {
        assert!(matches!(
            settings(0.6, interval).validate(),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case(-0.01)]
    #[case(1.01)]
    #[case(f64::NAN)]
    fn test_rejects_threshold_outside_unit_range(#[case] threshold: f64) {
        assert!(matches!(
            settings(threshold, 1.0).validate(),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    fn test_accepts_threshold_bounds(#[case] threshold: f64) {
        assert!(settings(threshold, 1.0).validate().is_ok());
    }

    #[rstest]
    #[case(1.0, 30.0, 30)]
    #[case(0.5, 30.0, 15)]
    #[case(1.0, 29.97, 30)]
    #[case(0.01, 30.0, 1)]
    #[case(0.001, 30.0, 1)]
    #[case(2.5, 1.0, 2)]
    #[case(3.5, 1.0, 4)]
    #[case(0.5, 1.0, 1)]
    fn test_stride(#[case] interval: f64, #[case] fps: f64, #[case] expected: usize) {
        assert_eq!(settings(0.6, interval).stride(fps), expected);
    }
}
