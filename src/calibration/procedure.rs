// CalibrationProcedure - guided whistle recording workflow
//
// This module manages the calibration workflow for one cooker:
// 1. start_recording: begin buffering feature records
// 2. push_frame: buffer records until the recording window elapses
// 3. stop_recording: reduce the buffered records to a CalibrationSample
// 4. Repeat (or enter frequencies manually) until enough samples exist
// 5. finalize: build the WhistleProfile
//
// A failed recording (no clear whistle) stores nothing; the user retries.

use crate::analysis::features::FeatureRecord;
use crate::calibration::profile::WhistleProfile;
use crate::calibration::progress::{CalibrationProgress, RecordingStatus};
use crate::calibration::sample::{analyze_recording, CalibrationSample};
use crate::calibration::validation::SampleValidator;
use crate::config::{CalibrationConfig, FeatureConfig};
use crate::error::CalibrationError;

/// Frames buffered for the recording in progress
#[derive(Debug)]
struct Recording {
    started_at_ms: u64,
    frames: Vec<FeatureRecord>,
}

/// CalibrationProcedure collects calibration samples and builds a profile
#[derive(Debug)]
pub struct CalibrationProcedure {
    config: CalibrationConfig,
    bands: FeatureConfig,
    samples: Vec<CalibrationSample>,
    recording: Option<Recording>,
}

impl CalibrationProcedure {
    /// Create a new calibration procedure
    ///
    /// # Arguments
    /// * `config` - Recording window, aggregation and profile parameters
    /// * `bands` - Whistle band limits used to filter peaks
    pub fn new(config: CalibrationConfig, bands: FeatureConfig) -> Self {
        Self {
            config,
            bands,
            samples: Vec::new(),
            recording: None,
        }
    }

    /// Create with default configuration (3 samples, 5 s recordings)
    pub fn new_default() -> Self {
        Self::new(CalibrationConfig::default(), FeatureConfig::default())
    }

    /// Begin a recording
    ///
    /// # Errors
    /// * `CalibrationError::RecordingInProgress` - A recording is already running
    pub fn start_recording(&mut self, now_ms: u64) -> Result<(), CalibrationError> {
        if self.recording.is_some() {
            return Err(CalibrationError::RecordingInProgress);
        }
        log::info!(
            "[CalibrationProcedure] Recording sample {} of {}",
            self.samples.len() + 1,
            self.config.samples_per_profile
        );
        self.recording = Some(Recording {
            started_at_ms: now_ms,
            frames: Vec::new(),
        });
        Ok(())
    }

    /// Buffer a feature record for the running recording
    ///
    /// Records arriving after the recording window are not buffered.
    pub fn push_frame(&mut self, record: FeatureRecord) -> RecordingStatus {
        let window = self.config.recording_window_ms;
        let recording = match self.recording.as_mut() {
            Some(recording) => recording,
            None => return RecordingStatus::Idle,
        };

        // The window runs on the frames' time base: a start stamped by a clock
        // that disagrees with the first frame is moved onto that frame
        if recording.frames.is_empty()
            && (record.timestamp_ms < recording.started_at_ms
                || record.timestamp_ms - recording.started_at_ms >= window)
        {
            recording.started_at_ms = record.timestamp_ms;
        }

        let elapsed_ms = record.timestamp_ms.saturating_sub(recording.started_at_ms);
        if elapsed_ms >= window {
            return RecordingStatus::WindowElapsed {
                frames: recording.frames.len(),
            };
        }

        recording.frames.push(record);
        RecordingStatus::Recording {
            elapsed_ms,
            frames: recording.frames.len(),
        }
    }

    /// End the running recording and analyse it
    ///
    /// # Returns
    /// * `Ok(CalibrationSample)` - Sample stored
    /// * `Err(CalibrationError::NoSignalDetected)` - Nothing stored; record again
    /// * `Err(CalibrationError::NotRecording)` - No recording was running
    pub fn stop_recording(&mut self, now_ms: u64) -> Result<CalibrationSample, CalibrationError> {
        let recording = self.recording.take().ok_or(CalibrationError::NotRecording)?;

        let sample = analyze_recording(&recording.frames, &self.bands, &self.config, now_ms)?;
        self.samples.push(sample);

        log::info!(
            "[CalibrationProcedure] Sample {} recorded: {:.0} Hz, amplitude {:.1}, {} frames",
            self.samples.len(),
            sample.frequency,
            sample.amplitude,
            sample.consistency
        );
        Ok(sample)
    }

    /// Abandon the running recording, if any
    pub fn cancel_recording(&mut self) {
        if self.recording.take().is_some() {
            log::info!("[CalibrationProcedure] Recording cancelled");
        }
    }

    /// Add a sample from a manually entered frequency
    ///
    /// # Errors
    /// * `CalibrationError::InvalidSample` - Frequency outside the whistle band
    /// * `CalibrationError::RecordingInProgress` - A recording is running
    pub fn add_manual_sample(
        &mut self,
        frequency: f32,
        now_ms: u64,
    ) -> Result<CalibrationSample, CalibrationError> {
        if self.recording.is_some() {
            return Err(CalibrationError::RecordingInProgress);
        }
        let sample = SampleValidator::manual_sample(frequency, &self.bands, now_ms)?;
        self.samples.push(sample);

        log::info!(
            "[CalibrationProcedure] Manual sample {} added: {:.0} Hz",
            self.samples.len(),
            frequency
        );
        Ok(sample)
    }

    /// Samples collected so far, oldest first
    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Get current calibration progress
    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            samples_collected: self.samples.len(),
            samples_needed: self.config.samples_per_profile,
            min_samples: self.config.min_samples.max(2),
            recording: self.recording.is_some(),
        }
    }

    /// Build the whistle profile from the collected samples
    ///
    /// # Errors
    /// * `CalibrationError::RecordingInProgress` - Stop the recording first
    /// * `CalibrationError::InsufficientCalibrationData` - Too few samples
    pub fn finalize(&self) -> Result<WhistleProfile, CalibrationError> {
        if self.recording.is_some() {
            return Err(CalibrationError::RecordingInProgress);
        }
        WhistleProfile::from_samples(&self.samples, &self.config)
    }

    /// Discard all samples and any running recording
    pub fn reset(&mut self) {
        self.samples.clear();
        self.recording = None;
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
