// FeatureExtractor - spectrum feature extraction for whistle detection
//
// This module turns one magnitude spectrum into a compact FeatureRecord:
// the dominant peak inside the whistle band, the energy in that band, the
// energy in the flanking noise bands, and their ratio.
//
// Module organization:
// - types: Data structures (FeatureRecord, DominantPeak)
// - fft: PCM to byte-scaled magnitude spectra (SpectrumAnalyser)
// - spectral: Band scans over magnitude spectra
// - mod.rs: Coordinator (FeatureExtractor)
//
// Bands (defaults):
// - whistle band:  [1000, 6000] Hz
// - noise bands:   [100, 1000) Hz and (6000, 10000] Hz

pub mod fft;
mod spectral;
mod types;

pub use fft::SpectrumAnalyser;
pub use types::{DominantPeak, FeatureRecord};

use std::ops::Bound;

use crate::config::FeatureConfig;
use spectral::{total_energy, SpectralBands};

/// FeatureExtractor computes per-frame spectrum features
///
/// Stateless apart from its configuration; safe to share across threads.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor with the given band configuration
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Band configuration in use
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract features from one magnitude spectrum
    ///
    /// # Arguments
    /// * `magnitudes` - Magnitude bins from 0 Hz up to Nyquist
    /// * `sample_rate` - Sample rate of the source audio in Hz
    /// * `timestamp_ms` - Monotonic capture time of the frame
    ///
    /// # Returns
    /// A FeatureRecord. Degenerate input (no bins or zero sample rate) yields a
    /// silent record rather than an error.
    pub fn extract(&self, magnitudes: &[f32], sample_rate: u32, timestamp_ms: u64) -> FeatureRecord {
        let bands = match SpectralBands::new(sample_rate, magnitudes.len()) {
            Some(bands) => bands,
            None => return FeatureRecord::silent(timestamp_ms),
        };

        let band = self.config.band_min_hz..=self.config.band_max_hz;

        let dominant_peak = bands
            .strongest_bin(magnitudes, band.clone())
            .filter(|&(_, amplitude)| amplitude > self.config.peak_floor)
            .map(|(bin_index, amplitude)| DominantPeak {
                frequency: bands.bin_frequency(bin_index),
                amplitude,
                bin_index,
            });

        let whistle_energy = bands.band_energy(magnitudes, band);
        let noise_energy = bands.band_energy(
            magnitudes,
            self.config.noise_low_min_hz..self.config.band_min_hz,
        ) + bands.band_energy(
            magnitudes,
            (
                Bound::Excluded(self.config.band_max_hz),
                Bound::Included(self.config.noise_high_max_hz),
            ),
        );

        FeatureRecord {
            dominant_peak,
            total_energy: total_energy(magnitudes),
            whistle_energy,
            noise_energy,
            signal_to_noise_ratio: whistle_energy / noise_energy.max(1.0),
            timestamp_ms,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;

    const SAMPLE_RATE: u32 = 44100;
    const BINS: usize = 1024;

    fn bin_for(frequency: f32) -> usize {
        (frequency / (SAMPLE_RATE as f32 / 2.0 / BINS as f32)).round() as usize
    }

    /// Spectrum with a single tone and a flat background
    fn tone_spectrum(frequency: f32, amplitude: f32, background: f32) -> Vec<f32> {
        let mut spectrum = vec![background; BINS];
        spectrum[bin_for(frequency)] = amplitude;
        spectrum
    }

    #[test]
    fn test_dominant_peak_in_band() {
        let extractor = FeatureExtractor::default();
        let spectrum = tone_spectrum(2500.0, 180.0, 0.0);

        let record = extractor.extract(&spectrum, SAMPLE_RATE, 42);
        let peak = record.dominant_peak.expect("peak expected");

        assert_eq!(peak.bin_index, bin_for(2500.0));
        assert!((peak.frequency - 2500.0).abs() < 21.6);
        assert_eq!(peak.amplitude, 180.0);
        assert_eq!(record.timestamp_ms, 42);
        assert_eq!(record.whistle_energy, 180.0 * 180.0);
        assert_eq!(record.total_energy, 180.0 * 180.0);
        assert_eq!(record.noise_energy, 0.0);
        // noise energy is clamped to 1 in the denominator
        assert_eq!(record.signal_to_noise_ratio, 180.0 * 180.0);
    }

    #[test]
    fn test_peak_below_floor_is_none_but_energy_remains() {
        let extractor = FeatureExtractor::default();
        let spectrum = tone_spectrum(3000.0, 20.0, 0.0);

        let record = extractor.extract(&spectrum, SAMPLE_RATE, 0);
        assert!(record.dominant_peak.is_none());
        assert_eq!(record.whistle_energy, 400.0);
    }

    #[test]
    fn test_out_of_band_tone_is_noise() {
        let extractor = FeatureExtractor::default();
        let spectrum = tone_spectrum(500.0, 200.0, 0.0);

        let record = extractor.extract(&spectrum, SAMPLE_RATE, 0);
        assert!(record.dominant_peak.is_none());
        assert_eq!(record.whistle_energy, 0.0);
        assert_eq!(record.noise_energy, 200.0 * 200.0);
        assert_eq!(record.signal_to_noise_ratio, 0.0);
    }

    #[test]
    fn test_energy_above_noise_band_only_counts_in_total() {
        let extractor = FeatureExtractor::default();
        let spectrum = tone_spectrum(15000.0, 100.0, 0.0);

        let record = extractor.extract(&spectrum, SAMPLE_RATE, 0);
        assert_eq!(record.noise_energy, 0.0);
        assert_eq!(record.whistle_energy, 0.0);
        assert_eq!(record.total_energy, 10000.0);
    }

    #[test]
    fn test_flat_background_ratios() {
        let extractor = FeatureExtractor::default();
        let spectrum = vec![10.0; BINS];

        let record = extractor.extract(&spectrum, SAMPLE_RATE, 0);
        // Whistle band spans 5000 Hz, noise bands 900 + 4000 Hz
        assert!(record.signal_to_noise_ratio > 0.9 && record.signal_to_noise_ratio < 1.1);
        assert!(record.energy_ratio() > 0.2 && record.energy_ratio() < 0.25);
        assert!(record.dominant_peak.is_none());
    }

    #[test]
    fn test_degenerate_input() {
        let extractor = FeatureExtractor::default();

        let empty = extractor.extract(&[], SAMPLE_RATE, 7);
        assert_eq!(empty, FeatureRecord::silent(7));

        let no_rate = extractor.extract(&tone_spectrum(2500.0, 200.0, 0.0), 0, 7);
        assert!(no_rate.dominant_peak.is_none());
        assert_eq!(no_rate.total_energy, 0.0);
        assert_eq!(no_rate.signal_to_noise_ratio, 0.0);
    }

    #[test]
    fn test_extract_from_analysed_noise_has_no_strong_peak() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let noise: Vec<f32> = (0..2048).map(|_| rng.gen_range(-0.001..0.001)).collect();

        let mut analyser = SpectrumAnalyser::new(&AudioConfig::default());
        let spectrum = analyser.process(&noise);
        let record = FeatureExtractor::default().extract(&spectrum, SAMPLE_RATE, 0);

        assert!(record.total_energy >= record.whistle_energy);
        assert!(record.signal_to_noise_ratio >= 0.0);
    }
}
