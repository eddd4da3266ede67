// Detector - sustained-pattern whistle detection state machine
//
// One WhistleDetector exists per armed detection session. Each FeatureRecord
// is classified against the active profile and pushed into a bounded window.
//
// Per record:
// 1. Push (record, matched) into the window, evicting the oldest entry
// 2. Pattern match: window holds at least `pattern_window` entries and at
//    least `pattern_min_matches` of the most recent `pattern_window` matched
// 3. Pattern match increments the sustained counter (capped at the window
//    capacity); otherwise the counter decays by `sustained_decay`, floored at 0
// 4. Sustained counter at `required_sustained_frames` and more than
//    `minimum_gap_ms` since the previous whistle fires a detection, resetting
//    the counter
//
// The detector never fails once constructed.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::analysis::classifier::{FrameClassifier, MatchVerdict};
use crate::analysis::features::{DominantPeak, FeatureRecord};
use crate::calibration::WhistleProfile;
use crate::config::DetectionConfig;

/// A whistle counted by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhistleDetection {
    /// Timestamp of the record that completed the sustained run
    pub timestamp_ms: u64,
    /// Sustained counter value at the moment of firing
    pub sustained_frames: u32,
}

/// Read-only view of the detector for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    pub dominant_peak: Option<DominantPeak>,
    pub signal_to_noise_ratio: f32,
    pub energy_ratio: f32,
    pub sustained_frames: u32,
    pub required_sustained_frames: u32,
    pub pattern_match: bool,
    pub profile_min_frequency: f32,
    pub profile_max_frequency: f32,
    pub amplitude_threshold: f32,
    /// Verdict for the most recent record, `None` before the first record
    pub last_verdict: Option<MatchVerdict>,
}

/// Whistle detection state for one armed session
pub struct WhistleDetector {
    profile: WhistleProfile,
    classifier: FrameClassifier,
    config: DetectionConfig,
    /// Recent records paired with their match result, oldest first
    window: VecDeque<(FeatureRecord, bool)>,
    sustained_frames: u32,
    /// Signed so the first whistle can fire right at session start
    last_event_ms: i64,
    last_verdict: Option<MatchVerdict>,
}

impl WhistleDetector {
    /// Arm a detector for `profile`
    ///
    /// # Arguments
    /// * `profile` - Active whistle profile
    /// * `classifier` - Per-frame classifier
    /// * `config` - Window size, pattern vote and cooldown
    /// * `started_at_ms` - Session start; the cooldown clock starts one full
    ///   gap before it, or before the first record if that is earlier
    pub fn new(
        profile: WhistleProfile,
        classifier: FrameClassifier,
        config: DetectionConfig,
        started_at_ms: u64,
    ) -> Self {
        let capacity = config.buffer_size.max(1);
        let last_event_ms = started_at_ms as i64 - config.minimum_gap_ms as i64;

        log::info!(
            "[Detector] Armed: band={:.1}-{:.1} Hz, amplitude threshold={:.1}, gap={} ms",
            profile.min_frequency,
            profile.max_frequency,
            classifier.amplitude_threshold(&profile),
            config.minimum_gap_ms
        );

        Self {
            profile,
            classifier,
            config,
            window: VecDeque::with_capacity(capacity),
            sustained_frames: 0,
            last_event_ms,
            last_verdict: None,
        }
    }

    /// Process one feature record
    ///
    /// # Returns
    /// `Some(WhistleDetection)` when this record completes a whistle
    pub fn process(&mut self, record: FeatureRecord) -> Option<WhistleDetection> {
        let verdict = self.classifier.evaluate(&self.profile, &record);
        let matched = verdict.is_match();
        self.last_verdict = Some(verdict);

        if self.window.is_empty() {
            // The first record is never inside the cooldown, whatever clock armed us
            let floor = record.timestamp_ms as i64 - self.config.minimum_gap_ms as i64;
            self.last_event_ms = self.last_event_ms.min(floor);
        }

        let capacity = self.capacity();
        while self.window.len() >= capacity {
            self.window.pop_front();
        }
        self.window.push_back((record, matched));

        let cap = capacity as u32;
        if self.is_pattern_match() {
            self.sustained_frames = (self.sustained_frames + 1).min(cap);
        } else {
            self.sustained_frames = self
                .sustained_frames
                .saturating_sub(self.config.sustained_decay);
        }

        tracing::trace!(
            timestamp_ms = record.timestamp_ms,
            matched,
            sustained = self.sustained_frames,
            "frame classified"
        );

        if self.sustained_frames < self.config.required_sustained_frames {
            return None;
        }

        let now = record.timestamp_ms as i64;
        if now - self.last_event_ms <= self.config.minimum_gap_ms as i64 {
            tracing::debug!(
                timestamp_ms = record.timestamp_ms,
                since_last_ms = now - self.last_event_ms,
                "sustained whistle inside cooldown, not counted"
            );
            return None;
        }

        let detection = WhistleDetection {
            timestamp_ms: record.timestamp_ms,
            sustained_frames: self.sustained_frames,
        };
        self.sustained_frames = 0;
        self.last_event_ms = now;

        log::info!(
            "[Detector] Whistle detected at {} ms ({} sustained frames)",
            detection.timestamp_ms,
            detection.sustained_frames
        );

        Some(detection)
    }

    /// Whether the pattern vote over the most recent records passes
    pub fn is_pattern_match(&self) -> bool {
        let window = self.config.pattern_window.max(1);
        if self.window.len() < window {
            return false;
        }
        let matches = self
            .window
            .iter()
            .rev()
            .take(window)
            .filter(|(_, matched)| *matched)
            .count();
        matches >= self.config.pattern_min_matches
    }

    pub fn sustained_frames(&self) -> u32 {
        self.sustained_frames
    }

    pub fn buffer_len(&self) -> usize {
        self.window.len()
    }

    pub fn profile(&self) -> &WhistleProfile {
        &self.profile
    }

    /// Diagnostic view of the latest record and the counter state
    pub fn snapshot(&self) -> DetectionSnapshot {
        let latest = self.window.back().map(|(record, _)| record);
        DetectionSnapshot {
            dominant_peak: latest.and_then(|r| r.dominant_peak),
            signal_to_noise_ratio: latest.map(|r| r.signal_to_noise_ratio).unwrap_or(0.0),
            energy_ratio: latest.map(|r| r.energy_ratio()).unwrap_or(0.0),
            sustained_frames: self.sustained_frames,
            required_sustained_frames: self.config.required_sustained_frames,
            pattern_match: self.is_pattern_match(),
            profile_min_frequency: self.profile.min_frequency,
            profile_max_frequency: self.profile.max_frequency,
            amplitude_threshold: self.classifier.amplitude_threshold(&self.profile),
            last_verdict: self.last_verdict,
        }
    }

    fn capacity(&self) -> usize {
        self.config.buffer_size.max(1)
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
