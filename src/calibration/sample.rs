// Calibration samples - one recording reduced to its dominant whistle tone
//
// Every frame of a recording whose peak is loud enough and inside the
// whistle band votes for a frequency bucket (peak frequency rounded to a
// multiple of 20 Hz). The bucket with the highest average amplitude x frame
// count wins, provided it collected at least 5 frames. Equal scores go to
// the bucket that received a frame first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::features::FeatureRecord;
use crate::config::{CalibrationConfig, FeatureConfig};
use crate::error::CalibrationError;

/// One recording's dominant tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSample {
    /// Bucket frequency in Hz
    pub frequency: f32,
    /// Average peak amplitude of the bucket's frames
    pub amplitude: f32,
    /// Number of frames in the winning bucket
    pub consistency: usize,
    /// Loudest peak amplitude in the winning bucket
    pub max_amplitude: f32,
    pub timestamp_ms: u64,
}

#[derive(Debug, Default)]
struct Bucket {
    /// Index of the first frame that landed in the bucket
    first_seen: usize,
    count: usize,
    amplitude_sum: f32,
    amplitude_max: f32,
}

impl Bucket {
    fn average(&self) -> f32 {
        self.amplitude_sum / self.count as f32
    }

    fn score(&self) -> f32 {
        self.average() * self.count as f32
    }
}

/// Reduce one recording to a calibration sample
///
/// # Arguments
/// * `frames` - Feature records captured during the recording
/// * `bands` - Whistle band limits
/// * `config` - Training floor, bucket width and minimum bucket size
/// * `timestamp_ms` - Time the sample is taken
///
/// # Returns
/// * `Ok(CalibrationSample)` - Dominant tone of the recording
/// * `Err(CalibrationError::NoSignalDetected)` - No bucket reached the minimum frame count
pub fn analyze_recording(
    frames: &[FeatureRecord],
    bands: &FeatureConfig,
    config: &CalibrationConfig,
    timestamp_ms: u64,
) -> Result<CalibrationSample, CalibrationError> {
    let width = config.bucket_width_hz.max(1.0);
    // Keyed by bucket index so iteration order is deterministic
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();

    for (index, peak) in frames
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.dominant_peak.map(|p| (i, p)))
    {
        if peak.amplitude <= config.training_amplitude_floor
            || peak.frequency < bands.band_min_hz
            || peak.frequency > bands.band_max_hz
        {
            continue;
        }
        let key = (peak.frequency / width).round() as i64;
        let bucket = buckets.entry(key).or_insert_with(|| Bucket {
            first_seen: index,
            ..Bucket::default()
        });
        bucket.count += 1;
        bucket.amplitude_sum += peak.amplitude;
        bucket.amplitude_max = bucket.amplitude_max.max(peak.amplitude);
    }

    let mut best: Option<(i64, &Bucket)> = None;
    for (&key, bucket) in buckets.iter() {
        if bucket.count < config.min_bucket_frames.max(1) {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, current)) => {
                bucket.score() > current.score()
                    || (bucket.score() == current.score() && bucket.first_seen < current.first_seen)
            }
        };
        if better {
            best = Some((key, bucket));
        }
    }

    let (key, bucket) = best.ok_or(CalibrationError::NoSignalDetected)?;
    let sample = CalibrationSample {
        frequency: key as f32 * width,
        amplitude: bucket.average(),
        consistency: bucket.count,
        max_amplitude: bucket.amplitude_max,
        timestamp_ms,
    };

    log::debug!(
        "[Calibration] Recording analysed: {} frames, {} buckets, winner {:.0} Hz ({} frames, avg amplitude {:.1})",
        frames.len(),
        buckets.len(),
        sample.frequency,
        sample.consistency,
        sample.amplitude
    );

    Ok(sample)
}
