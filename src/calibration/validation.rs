// Manual sample validation for calibration
//
// Users who know their cooker's whistle frequency (from a previous session or
// a tuner app) can enter it directly instead of recording. Entered values are
// validated against the whistle band before they become samples.

use crate::calibration::sample::CalibrationSample;
use crate::config::FeatureConfig;
use crate::error::CalibrationError;

/// Amplitude assigned to manually entered samples
pub const MANUAL_SAMPLE_AMPLITUDE: f32 = 150.0;
/// Consistency assigned to manually entered samples
pub const MANUAL_SAMPLE_CONSISTENCY: usize = 20;
/// Peak amplitude assigned to manually entered samples
pub const MANUAL_SAMPLE_MAX_AMPLITUDE: f32 = 200.0;

/// Validator for manually entered calibration samples
pub struct SampleValidator;

impl SampleValidator {
    /// Validate a manually entered frequency
    ///
    /// # Arguments
    /// * `frequency` - Entered frequency in Hz
    /// * `bands` - Whistle band limits
    ///
    /// # Returns
    /// * `Ok(())` - Frequency inside the whistle band (inclusive)
    /// * `Err(CalibrationError::InvalidSample)` - Not finite or out of range
    pub fn validate_frequency(frequency: f32, bands: &FeatureConfig) -> Result<(), CalibrationError> {
        if !frequency.is_finite() {
            return Err(CalibrationError::InvalidSample {
                reason: "Frequency must be a number".to_string(),
            });
        }

        if frequency < bands.band_min_hz || frequency > bands.band_max_hz {
            return Err(CalibrationError::InvalidSample {
                reason: format!(
                    "Frequency {} Hz out of range [{}, {}]",
                    frequency, bands.band_min_hz, bands.band_max_hz
                ),
            });
        }

        Ok(())
    }

    /// Validate a manually entered frequency and turn it into a sample
    pub fn manual_sample(
        frequency: f32,
        bands: &FeatureConfig,
        timestamp_ms: u64,
    ) -> Result<CalibrationSample, CalibrationError> {
        Self::validate_frequency(frequency, bands)?;
        Ok(CalibrationSample {
            frequency,
            amplitude: MANUAL_SAMPLE_AMPLITUDE,
            consistency: MANUAL_SAMPLE_CONSISTENCY,
            max_amplitude: MANUAL_SAMPLE_MAX_AMPLITUDE,
            timestamp_ms,
        })
    }
}
