//! Stature calibration from a raw pixel-height measurement
//!
//! Inverse-proportional model: `meters = reference_height * reference_span / pixel_height`.
//! The constants are per-camera geometry and come from configuration.

use crate::infra::config::Config;

/// Plausible adult stature band (m); samples outside are discarded
pub const MIN_STATURE_M: f64 = 1.0;
pub const MAX_STATURE_M: f64 = 2.2;

#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    reference_height_m: f64,
    reference_pixel_span: f64,
}

impl Calibration {
    pub fn new(reference_height_m: f64, reference_pixel_span: f64) -> Self {
        Self { reference_height_m, reference_pixel_span }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reference_height_m(), config.reference_pixel_span())
    }

    /// Convert a pixel height to meters
    ///
    /// Returns 0.0 for non-positive input, meaning "no valid measurement".
    #[inline]
    pub fn calibrate(&self, pixel_height: f64) -> f64 {
        if pixel_height <= 0.0 {
            return 0.0;
        }
        self.reference_height_m * self.reference_pixel_span / pixel_height
    }

    #[inline]
    pub fn is_plausible(meters: f64) -> bool {
        (MIN_STATURE_M..=MAX_STATURE_M).contains(&meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_returns_zero() {
        let calibration = Calibration::new(1.75, 240.0);
        assert_eq!(calibration.calibrate(0.0), 0.0);
        assert_eq!(calibration.calibrate(-12.5), 0.0);
        assert_eq!(calibration.calibrate(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_reference_span_yields_reference_height() {
        let calibration = Calibration::new(1.75, 240.0);
        assert!((calibration.calibrate(240.0) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_relationship() {
        let calibration = Calibration::new(1.75, 240.0);
        let near = calibration.calibrate(300.0);
        let far = calibration.calibrate(200.0);
        assert!(near < far);
        assert!((near - 1.4).abs() < 1e-12);
        assert!((far - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_plausible_band_inclusive() {
        assert!(Calibration::is_plausible(1.0));
        assert!(Calibration::is_plausible(2.2));
        assert!(!Calibration::is_plausible(0.99));
        assert!(!Calibration::is_plausible(2.21));
        assert!(!Calibration::is_plausible(0.0));
    }

    #[test]
    fn test_from_config() {
        let calibration = Calibration::from_config(&Config::default());
        assert!((calibration.calibrate(240.0) - 1.75).abs() < 1e-12);
    }
}
