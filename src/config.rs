//! Configuration management for detector tuning
//!
//! This module provides runtime configuration loading from JSON files so the
//! thresholds of the feature extractor, classifier and detector can be tuned
//! for a particular kitchen without recompiling. Every value defaults to the
//! constant the detector was tuned with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Frequency bands and floors used by the spectrum feature extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lower edge of the whistle band in Hz (inclusive)
    pub band_min_hz: f32,
    /// Upper edge of the whistle band in Hz (inclusive)
    pub band_max_hz: f32,
    /// Lower edge of the low noise band in Hz (inclusive, band ends at `band_min_hz`)
    pub noise_low_min_hz: f32,
    /// Upper edge of the high noise band in Hz (inclusive, band starts above `band_max_hz`)
    pub noise_high_max_hz: f32,
    /// Peak magnitude must exceed this to count as a dominant peak
    pub peak_floor: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            band_min_hz: 1000.0,
            band_max_hz: 6000.0,
            noise_low_min_hz: 100.0,
            noise_high_max_hz: 10000.0,
            peak_floor: 20.0,
        }
    }
}

/// Per-frame match thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fraction of the calibrated amplitude floor a live peak must reach
    pub amplitude_factor: f32,
    /// Signal-to-noise ratio must be strictly above this
    pub min_signal_to_noise: f32,
    /// In-band energy share must be strictly above this
    pub min_energy_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            // Live conditions are noisier than calibration
            amplitude_factor: 0.5,
            min_signal_to_noise: 2.0,
            min_energy_ratio: 0.15,
        }
    }
}

/// Detection state machine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Number of recent feature records kept in the window
    pub buffer_size: usize,
    /// Number of most recent records inspected for the pattern vote
    pub pattern_window: usize,
    /// Matching records needed inside the pattern window
    pub pattern_min_matches: usize,
    /// Sustained pattern matches needed before a whistle fires
    pub required_sustained_frames: u32,
    /// Penalty applied to the sustained counter when the pattern breaks
    pub sustained_decay: u32,
    /// Minimum time between two counted whistles in milliseconds
    pub minimum_gap_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 15,
            pattern_window: 3,
            pattern_min_matches: 2,
            required_sustained_frames: 8,
            sustained_decay: 2,
            minimum_gap_ms: 30_000,
        }
    }
}

/// Calibration procedure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of recordings the guided workflow asks for
    pub samples_per_profile: usize,
    /// Minimum samples needed to build a profile
    pub min_samples: usize,
    /// Recording auto-stops after this many milliseconds
    pub recording_window_ms: u64,
    /// Peak amplitude must exceed this to be considered during training
    pub training_amplitude_floor: f32,
    /// Peak frequencies are rounded to multiples of this many Hz
    pub bucket_width_hz: f32,
    /// Frames a bucket needs before it can be chosen
    pub min_bucket_frames: usize,
    /// Multiplier on the frequency standard deviation
    pub tolerance_factor: f32,
    /// Smallest half-width of the frequency band in Hz
    pub min_tolerance_hz: f32,
    /// Multiplier on the average amplitude for the amplitude floor
    pub min_amplitude_factor: f32,
    /// Lowest allowed amplitude floor
    pub min_amplitude_floor: f32,
    /// Multiplier on the average amplitude for the amplitude ceiling
    pub max_amplitude_factor: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples_per_profile: 3,
            min_samples: 2,
            recording_window_ms: 5_000,
            training_amplitude_floor: 30.0,
            bucket_width_hz: 20.0,
            min_bucket_frames: 5,
            tolerance_factor: 1.5,
            min_tolerance_hz: 80.0,
            min_amplitude_factor: 0.7,
            min_amplitude_floor: 100.0,
            max_amplitude_factor: 2.0,
        }
    }
}

/// Spectrum analyser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// FFT size in samples; the analyser yields `fft_size / 2` bins
    pub fft_size: usize,
    /// Weight of the previous frame in exponential smoothing (0.0-1.0)
    pub smoothing_time_constant: f32,
    /// Decibel value mapped to magnitude 0
    pub min_decibels: f32,
    /// Decibel value mapped to magnitude 255
    pub max_decibels: f32,
    /// Analysis frames per second of audio
    pub frames_per_second: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            frames_per_second: 60,
        }
    }
}

/// Profile persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the saved profile collection
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cooker_whistle_profiles.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults when the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/whistle_config.json")
    }
}
