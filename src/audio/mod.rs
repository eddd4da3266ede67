// Audio module - spectrum frame sources
//
// The counter consumes magnitude spectra, not PCM. A SpectrumSource yields
// one SpectrumFrame per analysis tick; the shipped sources run PCM (from a
// WAV file or a synthesised tone) through the SpectrumAnalyser.

pub mod pcm_source;
pub mod synth;

pub use pcm_source::{read_wav, PcmSpectrumSource};

use serde::{Deserialize, Serialize};

/// One magnitude spectrum with its capture metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    /// Magnitude bins from 0 Hz up to Nyquist, on the 0-255 scale
    pub magnitudes: Vec<f32>,
    pub sample_rate: u32,
    /// Monotonic capture time in milliseconds
    pub timestamp_ms: u64,
}

/// Producer of spectrum frames
pub trait SpectrumSource {
    /// Next frame, or `None` when the source is exhausted
    fn next_frame(&mut self) -> Option<SpectrumFrame>;
}
