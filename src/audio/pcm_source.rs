// PCM-backed spectrum source
//
// Slices a mono PCM buffer into hops of `sample_rate / frames_per_second`
// samples. For every hop the analyser sees the most recent `fft_size`
// samples ending at the hop boundary, and the frame is stamped with that
// boundary's offset in milliseconds.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::analysis::features::SpectrumAnalyser;
use crate::audio::{SpectrumFrame, SpectrumSource};
use crate::config::AudioConfig;

/// Spectrum frames computed from an in-memory PCM buffer
pub struct PcmSpectrumSource {
    samples: Vec<f32>,
    sample_rate: u32,
    analyser: SpectrumAnalyser,
    hop: usize,
    /// End of the next hop, in samples
    position: usize,
    start_offset_ms: u64,
}

impl PcmSpectrumSource {
    /// Create a source over `samples`
    ///
    /// # Arguments
    /// * `samples` - Mono PCM in [-1.0, 1.0]
    /// * `sample_rate` - Sample rate in Hz
    /// * `config` - Analyser settings and frame rate
    pub fn new(samples: Vec<f32>, sample_rate: u32, config: &AudioConfig) -> Self {
        let fps = config.frames_per_second.max(1);
        let hop = (sample_rate / fps).max(1) as usize;
        Self {
            samples,
            sample_rate,
            analyser: SpectrumAnalyser::new(config),
            hop,
            position: hop,
            start_offset_ms: 0,
        }
    }

    /// Load a mono WAV file
    pub fn from_wav<P: AsRef<Path>>(path: P, config: &AudioConfig) -> Result<Self> {
        let (samples, sample_rate) = read_wav(path.as_ref())?;
        Ok(Self::new(samples, sample_rate, config))
    }

    /// Shift every frame timestamp by `offset_ms`
    pub fn starting_at(mut self, offset_ms: u64) -> Self {
        self.start_offset_ms = offset_ms;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the buffer in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

impl SpectrumSource for PcmSpectrumSource {
    fn next_frame(&mut self) -> Option<SpectrumFrame> {
        if self.sample_rate == 0 || self.position > self.samples.len() {
            return None;
        }

        let end = self.position;
        let magnitudes = self.analyser.process(&self.samples[..end]);
        let timestamp_ms = self.start_offset_ms + end as u64 * 1000 / self.sample_rate as u64;
        self.position += self.hop;

        Some(SpectrumFrame {
            magnitudes,
            sample_rate: self.sample_rate,
            timestamp_ms,
        })
    }
}

impl Iterator for PcmSpectrumSource {
    type Item = SpectrumFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

/// Read a mono WAV file into normalised f32 samples
///
/// # Returns
/// `(samples, sample_rate)`
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(anyhow!(
            "Recording {} must be mono (found {} channels)",
            path.display(),
            spec.channels
        ));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|v| v as f32 / max).map_err(|err| anyhow!(err)))
                    .collect::<Result<Vec<f32>>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / max).map_err(|err| anyhow!(err)))
                    .collect::<Result<Vec<f32>>>()?,
                other => {
                    return Err(anyhow!(
                        "Unsupported bits per sample {} in {}",
                        other,
                        path.display()
                    ))
                }
            }
        }
    };

    log::debug!(
        "[Audio] Read {} samples at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.display()
    );

    Ok((samples, spec.sample_rate))
}
