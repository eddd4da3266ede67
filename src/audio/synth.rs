// Synthetic PCM for tests and demos
//
// Deterministic signals only: sine tones, silence, and concatenation.

use std::f64::consts::PI;

/// Sine tone of `duration_ms` milliseconds
pub fn sine_wave(sample_rate: u32, frequency: f32, amplitude: f32, duration_ms: u64) -> Vec<f32> {
    let len = sample_count(sample_rate, duration_ms);
    // Phase in f64; f32 phase drifts audibly over tens of seconds
    let step = 2.0 * PI * frequency as f64 / sample_rate as f64;
    (0..len)
        .map(|i| amplitude * (step * i as f64).sin() as f32)
        .collect()
}

pub fn silence(sample_rate: u32, duration_ms: u64) -> Vec<f32> {
    vec![0.0; sample_count(sample_rate, duration_ms)]
}

/// Join segments end to end
pub fn concat(segments: &[Vec<f32>]) -> Vec<f32> {
    segments.iter().flatten().copied().collect()
}

fn sample_count(sample_rate: u32, duration_ms: u64) -> usize {
    (sample_rate as u64 * duration_ms / 1000) as usize
}
