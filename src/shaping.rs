use std::f64::consts::FRAC_PI_2;

use serde::Deserialize;

use crate::error::ScoreError;
use crate::model::condition::Score;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ShapeParams {
    pub p: f64,
    pub sigma: f64,
}

impl ShapeParams {
    pub const PARITY: ShapeParams = ShapeParams { p: 3.0, sigma: 20.0 };
    pub const AGE: ShapeParams = ShapeParams { p: 2.5, sigma: 500.0 };
    pub const HEIGHT: ShapeParams = ShapeParams { p: 3.0, sigma: 50.0 };
}

/// Bounds of the raw score range that [`normalize`] spreads over [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Calibration {
    pub min: f64,
    pub max: f64,
}

impl Calibration {
    pub const DIVERSITY: Calibration = Calibration { min: 0.25, max: 0.75 };
    pub const AGE: Calibration = Calibration { min: 0.12, max: 0.35 };
    pub const HEIGHT: Calibration = Calibration { min: 0.5, max: 0.9 };
}

/// Bell-shaped similarity between `value` and `target`.
///
/// Returns 1 when both are equal and decays symmetrically with the gap. `p` widens the
/// plateau around the peak, `sigma` sharpens the fall-off. Gaps beyond ±0.5 score 0.
pub fn shape(value: f64, target: f64, params: ShapeParams) -> Score {
    let x = 0.5 + (value - target);
    if !(0.0..=1.0).contains(&x) {
        return 0.0;
    }
    let centered = 2.0 * x - 1.0;
    (-params.sigma * centered.abs().powf(params.p)).exp() * (FRAC_PI_2 * centered).cos()
}

/// Linear rescale of `score` from `[min, max]` to `[0, 1]`, clamped at both ends.
pub fn normalize(score: Score, calibration: Calibration) -> Result<Score, ScoreError> {
    let span = calibration.max - calibration.min;
    if span == 0.0 {
        return Err(ScoreError::DegenerateCalibration(calibration.min));
    }
    Ok(((score - calibration.min) / span).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const UNIT: Calibration = Calibration { min: 0.0, max: 1.0 };

    #[test]
    fn shape_peaks_at_target() {
        assert_eq!(shape(0.3, 0.3, ShapeParams::PARITY), 1.0);
        assert_eq!(shape(0.0, 0.0, ShapeParams::AGE), 1.0);
    }

    #[test]
    fn shape_is_zero_outside_half_unit_gap() {
        assert_eq!(shape(0.9, 0.3, ShapeParams::PARITY), 0.0);
        assert_eq!(shape(0.0, 0.6, ShapeParams::PARITY), 0.0);
    }

    #[test]
    fn shape_decays_with_gap() {
        let near = shape(0.52, 0.5, ShapeParams::PARITY);
        let far = shape(0.65, 0.5, ShapeParams::PARITY);
        assert!(near < 1.0);
        assert!(far < near);
        assert!(far > 0.0);
    }

    #[test]
    fn normalize_clamps_to_unit_range() {
        assert_eq!(normalize(-0.1, UNIT).unwrap(), 0.0);
        assert_eq!(normalize(1.5, UNIT).unwrap(), 1.0);
        assert_eq!(normalize(0.5, UNIT).unwrap(), 0.5);
    }

    #[test]
    fn normalize_rescales_calibrated_range() {
        let mid = normalize(0.5, Calibration::DIVERSITY).unwrap();
        assert!((mid - 0.5).abs() < 1e-12);
        assert_eq!(normalize(0.2, Calibration::DIVERSITY).unwrap(), 0.0);
        assert_eq!(normalize(0.8, Calibration::DIVERSITY).unwrap(), 1.0);
    }

    #[test]
    fn normalize_rejects_degenerate_calibration() {
        let flat = Calibration { min: 0.4, max: 0.4 };
        assert_eq!(normalize(0.4, flat), Err(ScoreError::DegenerateCalibration(0.4)));
    }

    proptest! {
        #[test]
        fn shape_is_symmetric(
            target in 0.0f64..1.0,
            delta in 0.0f64..0.5,
            p in 1.0f64..5.0,
            sigma in 0.1f64..600.0,
        ) {
            let params = ShapeParams { p, sigma };
            let above = shape(target + delta, target, params);
            let below = shape(target - delta, target, params);
            prop_assert!((above - below).abs() < 1e-9);
        }

        #[test]
        fn shape_hits_one_on_target(target in -1.0f64..2.0, p in 0.5f64..5.0, sigma in 0.1f64..600.0) {
            prop_assert_eq!(shape(target, target, ShapeParams { p, sigma }), 1.0);
        }

        #[test]
        fn shape_stays_bounded(value in -1.0f64..2.0, target in 0.0f64..1.0) {
            let score = shape(value, target, ShapeParams::PARITY);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn normalize_stays_in_unit_range(score in -10.0f64..10.0) {
            let value = normalize(score, Calibration::AGE).unwrap();
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}
