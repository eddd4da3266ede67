// FFT module - PCM to byte-scaled magnitude spectra
//
// The detection thresholds (peak floor, training floor, amplitude floor) were
// tuned against an analyser that reports magnitudes as decibels linearly
// mapped onto 0-255. This module reproduces that analyser: Blackman window,
// forward FFT, magnitude normalised by the FFT size, exponential smoothing
// against the previous frame, then dB conversion and clamping.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::config::AudioConfig;

/// Stateful analyser producing one magnitude frame per call
///
/// Holds the smoothed spectrum of the previous frame, so one analyser must be
/// used per audio stream.
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Blackman window (pre-computed)
    window: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    /// Smoothed linear magnitudes of the previous frame
    previous: Vec<f32>,
}

impl SpectrumAnalyser {
    /// Create a new analyser from the audio configuration
    ///
    /// # Arguments
    /// * `config` - FFT size, smoothing constant and decibel range
    pub fn new(config: &AudioConfig) -> Self {
        let fft_size = config.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            window: blackman_window(fft_size),
            smoothing: config.smoothing_time_constant.clamp(0.0, 1.0),
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            previous: vec![0.0; fft_size / 2],
        }
    }

    /// FFT window size in samples
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of magnitude bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyse the most recent `fft_size` samples
    ///
    /// Shorter input is zero-padded at the front, so the newest samples stay
    /// aligned with the end of the window.
    ///
    /// # Returns
    /// Magnitude spectrum of `fft_size / 2` bins on the 0-255 scale
    pub fn process(&mut self, audio: &[f32]) -> Vec<f32> {
        let start = audio.len().saturating_sub(self.fft_size);
        let recent = &audio[start..];
        let pad = self.fft_size - recent.len();

        let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(self.fft_size);
        buffer.extend((0..pad).map(|_| Complex::new(0.0, 0.0)));
        buffer.extend(
            recent
                .iter()
                .zip(&self.window[pad..])
                .map(|(&sample, &w)| Complex::new(sample * w, 0.0)),
        );

        self.fft.process(&mut buffer);

        let scale = 1.0 / self.fft_size as f32;
        let range = (self.max_decibels - self.min_decibels).max(f32::EPSILON);

        buffer[..self.bin_count()]
            .iter()
            .zip(self.previous.iter_mut())
            .map(|(c, prev)| {
                let magnitude = c.norm() * scale;
                *prev = self.smoothing * *prev + (1.0 - self.smoothing) * magnitude;
                let db = if *prev > 0.0 {
                    20.0 * prev.log10()
                } else {
                    f32::NEG_INFINITY
                };
                (255.0 * (db - self.min_decibels) / range).clamp(0.0, 255.0).floor()
            })
            .collect()
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.previous.iter_mut().for_each(|v| *v = 0.0);
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            a0 - a1 * (2.0 * std::f32::consts::PI * x).cos()
                + a2 * (4.0 * std::f32::consts::PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine_wave(sample_rate: u32, frequency: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_bin_count() {
        let analyser = SpectrumAnalyser::new(&AudioConfig::default());
        assert_eq!(analyser.fft_size(), 2048);
        assert_eq!(analyser.bin_count(), 1024);
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let mut analyser = SpectrumAnalyser::new(&AudioConfig::default());
        let spectrum = analyser.process(&vec![0.0; 2048]);
        assert_eq!(spectrum.len(), 1024);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peak_lands_in_expected_bin() {
        let sample_rate = 44100;
        let mut analyser = SpectrumAnalyser::new(&AudioConfig::default());
        let signal = generate_sine_wave(sample_rate, 3000.0, 0.5, 2048);

        let mut spectrum = Vec::new();
        for _ in 0..10 {
            spectrum = analyser.process(&signal);
        }

        let bin_width = sample_rate as f32 / 2048.0;
        let expected_bin = (3000.0 / bin_width).round() as usize;
        let (peak_bin, peak) = spectrum
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc });

        assert!(peak > 200.0, "expected a loud peak, got {}", peak);
        assert!(
            (peak_bin as i64 - expected_bin as i64).abs() <= 2,
            "peak bin {} too far from {}",
            peak_bin,
            expected_bin
        );
        // Far away from the tone the spectrum stays quiet
        assert!(spectrum[expected_bin / 4] < 50.0);
    }

    #[test]
    fn test_smoothing_ramps_up() {
        let mut analyser = SpectrumAnalyser::new(&AudioConfig {
            max_decibels: 0.0,
            min_decibels: -100.0,
            ..AudioConfig::default()
        });
        let signal = generate_sine_wave(44100, 2000.0, 0.5, 2048);
        let bin = (2000.0f32 / (44100.0 / 2048.0)).round() as usize;

        let first = analyser.process(&signal)[bin];
        let later = (0..20).map(|_| analyser.process(&signal)[bin]).last().unwrap();
        assert!(later > first, "smoothed level should grow: {} -> {}", first, later);

        analyser.reset();
        let after_reset = analyser.process(&signal)[bin];
        assert!((after_reset - first).abs() <= 1.0);
    }

    #[test]
    fn test_short_input_is_padded() {
        let mut analyser = SpectrumAnalyser::new(&AudioConfig::default());
        let short = generate_sine_wave(44100, 2000.0, 0.5, 512);
        let spectrum = analyser.process(&short);
        assert_eq!(spectrum.len(), 1024);
    }
}
