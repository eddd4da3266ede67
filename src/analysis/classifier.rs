// Classifier - per-frame whistle pattern matching
//
// This module decides whether a single FeatureRecord looks like the
// calibrated whistle. A frame matches only when every rule holds, checked in
// this order:
//
// 1. A dominant peak is present
// 2. The peak frequency lies inside the profile band (inclusive)
// 3. The peak amplitude reaches half the calibrated amplitude floor
// 4. Signal-to-noise ratio is above 2.0
// 5. More than 15% of the spectral energy sits in the whistle band
//
// The profile's amplitude ceiling is not checked here.

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureRecord;
use crate::calibration::WhistleProfile;
use crate::config::ClassifierConfig;

/// Outcome of matching one frame, naming the first rule that failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MatchVerdict {
    /// Every rule held
    Match,
    /// No dominant peak in the whistle band
    NoPeak,
    /// Peak outside the calibrated band
    FrequencyOutOfBand { frequency: f32 },
    /// Peak quieter than the live amplitude floor
    AmplitudeTooLow { amplitude: f32, required: f32 },
    /// Too much energy in the noise bands
    SignalToNoiseTooLow { ratio: f32 },
    /// Too little of the total energy in the whistle band
    EnergyRatioTooLow { ratio: f32 },
}

impl MatchVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchVerdict::Match)
    }
}

/// FrameClassifier applies the match rules against a whistle profile
///
/// Holds only thresholds; the profile is passed per call so one classifier
/// can serve any number of detectors.
#[derive(Debug, Clone)]
pub struct FrameClassifier {
    config: ClassifierConfig,
}

impl FrameClassifier {
    /// Create a new FrameClassifier with the given thresholds
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Amplitude a live peak needs to reach for `profile`
    pub fn amplitude_threshold(&self, profile: &WhistleProfile) -> f32 {
        profile.min_amplitude * self.config.amplitude_factor
    }

    /// Evaluate every rule and report the first failure
    ///
    /// # Arguments
    /// * `profile` - Calibrated whistle profile
    /// * `record` - Features of one frame
    pub fn evaluate(&self, profile: &WhistleProfile, record: &FeatureRecord) -> MatchVerdict {
        let peak = match record.dominant_peak {
            Some(peak) => peak,
            None => return MatchVerdict::NoPeak,
        };

        if peak.frequency < profile.min_frequency || peak.frequency > profile.max_frequency {
            return MatchVerdict::FrequencyOutOfBand {
                frequency: peak.frequency,
            };
        }

        let required = self.amplitude_threshold(profile);
        if peak.amplitude < required {
            return MatchVerdict::AmplitudeTooLow {
                amplitude: peak.amplitude,
                required,
            };
        }

        if record.signal_to_noise_ratio <= self.config.min_signal_to_noise {
            return MatchVerdict::SignalToNoiseTooLow {
                ratio: record.signal_to_noise_ratio,
            };
        }

        let energy_ratio = record.energy_ratio();
        if energy_ratio <= self.config.min_energy_ratio {
            return MatchVerdict::EnergyRatioTooLow {
                ratio: energy_ratio,
            };
        }

        MatchVerdict::Match
    }

    /// Check whether a frame matches the profile
    pub fn matches(&self, profile: &WhistleProfile, record: &FeatureRecord) -> bool {
        self.evaluate(profile, record).is_match()
    }
}

impl Default for FrameClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
