// WhistleProfile - calibrated fingerprint of one cooker's whistle
//
// A profile is built from two or more CalibrationSamples:
// - target frequency = mean of the sample frequencies
// - band half-width  = max(1.5 x population stddev, 80 Hz)
// - amplitude floor  = max(0.7 x mean amplitude, 100)
// - amplitude ceiling = 2.0 x mean amplitude
//
// The floors stop very consistent or very quiet calibrations from producing
// a band or amplitude floor that is too narrow or too loose.

use serde::{Deserialize, Serialize};

use crate::calibration::sample::CalibrationSample;
use crate::config::CalibrationConfig;
use crate::error::CalibrationError;

/// Calibrated frequency band and amplitude bounds
///
/// Field names follow the profile lists exported by the browser version of
/// the counter, so those files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhistleProfile {
    /// Mean calibrated frequency in Hz
    pub target_frequency: f32,
    /// Lower edge of the accepted band in Hz
    pub min_frequency: f32,
    /// Upper edge of the accepted band in Hz
    pub max_frequency: f32,
    /// Amplitude floor
    pub min_amplitude: f32,
    /// Amplitude ceiling
    pub max_amplitude: f32,
    /// Number of calibration samples the profile was built from
    #[serde(rename = "samples")]
    pub sample_count: usize,
}

impl WhistleProfile {
    /// Build a profile from calibration samples
    ///
    /// # Arguments
    /// * `samples` - Samples collected during calibration
    /// * `config` - Tolerance and amplitude factors
    ///
    /// # Returns
    /// * `Ok(WhistleProfile)` - Profile satisfying `min_frequency < target_frequency < max_frequency`
    /// * `Err(CalibrationError::InsufficientCalibrationData)` - Fewer than `config.min_samples` samples
    pub fn from_samples(
        samples: &[CalibrationSample],
        config: &CalibrationConfig,
    ) -> Result<Self, CalibrationError> {
        let required = config.min_samples.max(2);
        if samples.len() < required {
            return Err(CalibrationError::InsufficientCalibrationData {
                required,
                collected: samples.len(),
            });
        }

        let count = samples.len() as f32;
        let target_frequency = samples.iter().map(|s| s.frequency).sum::<f32>() / count;
        let avg_amplitude = samples.iter().map(|s| s.amplitude).sum::<f32>() / count;

        let variance = samples
            .iter()
            .map(|s| (s.frequency - target_frequency).powi(2))
            .sum::<f32>()
            / count;
        let std_dev = variance.sqrt();

        let tolerance = (std_dev * config.tolerance_factor).max(config.min_tolerance_hz.max(f32::EPSILON));

        let min_amplitude =
            (avg_amplitude * config.min_amplitude_factor).max(config.min_amplitude_floor);
        let ceiling = avg_amplitude * config.max_amplitude_factor;
        // Only very quiet calibrations put the ceiling at or under the floor
        let max_amplitude = if ceiling > min_amplitude {
            ceiling
        } else {
            min_amplitude * config.max_amplitude_factor.max(1.0 + f32::EPSILON)
        };

        let profile = Self {
            target_frequency,
            min_frequency: target_frequency - tolerance,
            max_frequency: target_frequency + tolerance,
            min_amplitude,
            max_amplitude,
            sample_count: samples.len(),
        };

        log::info!(
            "[Calibration] Whistle profile created: target={:.1} Hz, band={:.1}-{:.1} Hz, amplitude={:.1}-{:.1}, samples={}",
            profile.target_frequency,
            profile.min_frequency,
            profile.max_frequency,
            profile.min_amplitude,
            profile.max_amplitude,
            profile.sample_count
        );

        Ok(profile)
    }

    /// Half-width of the accepted frequency band in Hz
    pub fn tolerance(&self) -> f32 {
        (self.max_frequency - self.min_frequency) / 2.0
    }

    /// Whether `frequency` lies inside the accepted band (inclusive)
    pub fn contains_frequency(&self, frequency: f32) -> bool {
        frequency >= self.min_frequency && frequency <= self.max_frequency
    }
}
