// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`CalibrationError::code`].
///
/// Error code range: 2001-2007
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// A recording yielded no qualifying frequency bucket
    pub const NO_SIGNAL_DETECTED: i32 = 2001;

    /// Fewer calibration samples than a profile needs
    pub const INSUFFICIENT_CALIBRATION_DATA: i32 = 2002;

    /// A manually entered sample was rejected
    pub const INVALID_SAMPLE: i32 = 2003;

    /// No calibration session is active
    pub const NOT_IN_PROGRESS: i32 = 2004;

    /// A recording is already running
    pub const RECORDING_IN_PROGRESS: i32 = 2005;

    /// No recording is running
    pub const NOT_RECORDING: i32 = 2006;

    /// Calibration state lock was poisoned
    pub const STATE_POISONED: i32 = 2007;
}

/// Log a calibration error with structured context
///
/// Emits the numeric code, the component and the message so log scrapers can
/// group failures without parsing the message text.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationProcedure, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover the recording workflow, sample aggregation and
/// profile construction.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// The recording contained no sustained in-band tone; the user should retry
    NoSignalDetected,

    /// Not enough calibration samples to build a profile
    InsufficientCalibrationData { required: usize, collected: usize },

    /// Sample rejected before it reached the aggregator
    InvalidSample { reason: String },

    /// Calibration session has not been started
    NotInProgress,

    /// A recording is already being captured
    RecordingInProgress,

    /// Stop requested while no recording is running
    NotRecording,

    /// Calibration state lock was poisoned
    StatePoisoned,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NoSignalDetected => CalibrationErrorCodes::NO_SIGNAL_DETECTED,
            CalibrationError::InsufficientCalibrationData { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_CALIBRATION_DATA
            }
            CalibrationError::InvalidSample { .. } => CalibrationErrorCodes::INVALID_SAMPLE,
            CalibrationError::NotInProgress => CalibrationErrorCodes::NOT_IN_PROGRESS,
            CalibrationError::RecordingInProgress => CalibrationErrorCodes::RECORDING_IN_PROGRESS,
            CalibrationError::NotRecording => CalibrationErrorCodes::NOT_RECORDING,
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NoSignalDetected => {
                "No clear whistle detected. Please try again.".to_string()
            }
            CalibrationError::InsufficientCalibrationData {
                required,
                collected,
            } => {
                format!(
                    "Insufficient calibration data: need {}, got {}",
                    required, collected
                )
            }
            CalibrationError::InvalidSample { reason } => {
                format!("Invalid sample: {}", reason)
            }
            CalibrationError::NotInProgress => "Calibration not in progress".to_string(),
            CalibrationError::RecordingInProgress => "Recording already in progress".to_string(),
            CalibrationError::NotRecording => "No recording in progress".to_string(),
            CalibrationError::StatePoisoned => "Calibration state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
