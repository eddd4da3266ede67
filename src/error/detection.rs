// Detection error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Detection error code constants
///
/// Error code range: 3001-3003
pub struct DetectionErrorCodes {}

impl DetectionErrorCodes {
    /// Detection requested without an active whistle profile
    pub const NO_ACTIVE_PROFILE: i32 = 3001;

    /// Detection is not running
    pub const NOT_RUNNING: i32 = 3002;

    /// Detection state lock was poisoned
    pub const STATE_POISONED: i32 = 3003;
}

/// Log a detection error with structured context
pub fn log_detection_error(err: &DetectionError, context: &str) {
    error!(
        "Detection error in {}: code={}, component=WhistleDetector, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Detection-related errors
///
/// Only session management can fail. Once a detector is armed every frame is
/// accepted; frames without a usable peak simply do not match.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// No whistle profile has been calibrated or loaded
    NoActiveProfile,

    /// Detection has not been started
    NotRunning,

    /// Detection state lock was poisoned
    StatePoisoned,
}

impl ErrorCode for DetectionError {
    fn code(&self) -> i32 {
        match self {
            DetectionError::NoActiveProfile => DetectionErrorCodes::NO_ACTIVE_PROFILE,
            DetectionError::NotRunning => DetectionErrorCodes::NOT_RUNNING,
            DetectionError::StatePoisoned => DetectionErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            DetectionError::NoActiveProfile => {
                "No whistle profile available. Please calibrate first or load a saved profile."
                    .to_string()
            }
            DetectionError::NotRunning => {
                "Detection not running. Call start_detection() first.".to_string()
            }
            DetectionError::StatePoisoned => "Detection state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DetectionError {}
