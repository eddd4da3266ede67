// Types module - Data structures for spectrum features
//
// This module defines the per-frame feature record produced by the
// extractor and consumed by calibration and detection.

use serde::{Deserialize, Serialize};

/// Strongest bin inside the whistle band for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantPeak {
    /// Bin centre frequency in Hz
    pub frequency: f32,
    /// Magnitude on the analyser's 0-255 scale
    pub amplitude: f32,
    /// Index of the bin in the magnitude array
    pub bin_index: usize,
}

/// Features extracted from one spectrum frame
///
/// A record without a dominant peak can still carry in-band energy: low-level
/// content that never rose above the peak floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Strongest in-band bin, if it exceeded the peak floor
    pub dominant_peak: Option<DominantPeak>,

    /// Sum of squared magnitudes over the whole spectrum
    pub total_energy: f32,

    /// Sum of squared magnitudes over the whistle band
    pub whistle_energy: f32,

    /// Sum of squared magnitudes over the two flanking noise bands
    pub noise_energy: f32,

    /// `whistle_energy / max(noise_energy, 1)`
    pub signal_to_noise_ratio: f32,

    /// Monotonic capture time in milliseconds
    pub timestamp_ms: u64,
}

impl FeatureRecord {
    /// Record for a frame that carried no usable signal
    pub fn silent(timestamp_ms: u64) -> Self {
        Self {
            dominant_peak: None,
            total_energy: 0.0,
            whistle_energy: 0.0,
            noise_energy: 0.0,
            signal_to_noise_ratio: 0.0,
            timestamp_ms,
        }
    }

    /// Share of the total energy concentrated in the whistle band
    pub fn energy_ratio(&self) -> f32 {
        self.whistle_energy / self.total_energy.max(1.0)
    }
}
