// Progress tracking for calibration workflow
//
// This module provides types for tracking progress through the guided
// recording workflow and for reporting the state of a running recording.

use serde::{Deserialize, Serialize};

/// Progress information for the calibration workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationProgress {
    /// Number of samples collected so far
    pub samples_collected: usize,
    /// Number of samples the guided workflow asks for
    pub samples_needed: usize,
    /// Minimum samples needed to build a profile
    pub min_samples: usize,
    /// Whether a recording is currently running
    pub recording: bool,
}

impl CalibrationProgress {
    /// Whether enough samples exist to build a profile
    pub fn can_finalize(&self) -> bool {
        self.samples_collected >= self.min_samples
    }

    /// Whether the guided workflow has collected all requested samples
    pub fn is_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }
}

/// State of the recording after a frame was pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordingStatus {
    /// No recording is running; the frame was ignored
    Idle,
    /// Frame buffered
    Recording { elapsed_ms: u64, frames: usize },
    /// Recording window is over; the caller should stop the recording
    WindowElapsed { frames: usize },
}

impl RecordingStatus {
    pub fn is_window_elapsed(&self) -> bool {
        matches!(self, RecordingStatus::WindowElapsed { .. })
    }
}
