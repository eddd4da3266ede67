// Error types for the whistle counter
//
// This module defines custom error types for calibration, detection and
// profile persistence, providing structured error handling with numeric codes
// that callers can surface without matching on every variant.

mod calibration;
mod detection;
mod store;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use detection::{log_detection_error, DetectionError, DetectionErrorCodes};
pub use store::{log_store_error, StoreError, StoreErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error reporting across
/// the CLI and any embedding shell.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Failure while routing a frame through the session
///
/// A frame can reach either the calibration or the detection manager, so
/// this wraps whichever domain error occurred. Codes are those of the
/// wrapped error.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Calibration(CalibrationError),
    Detection(DetectionError),
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::Calibration(err) => err.code(),
            SessionError::Detection(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::Calibration(err) => err.message(),
            SessionError::Detection(err) => err.message(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Calibration(err) => std::fmt::Display::fmt(err, f),
            SessionError::Detection(err) => std::fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CalibrationError> for SessionError {
    fn from(err: CalibrationError) -> Self {
        SessionError::Calibration(err)
    }
}

impl From<DetectionError> for SessionError {
    fn from(err: DetectionError) -> Self {
        SessionError::Detection(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_objects() {
        let errors: Vec<Box<dyn ErrorCode>> = vec![
            Box::new(CalibrationError::NoSignalDetected),
            Box::new(DetectionError::NoActiveProfile),
            Box::new(StoreError::ProfileNameRequired),
        ];

        let codes: Vec<i32> = errors.iter().map(|err| err.code()).collect();
        assert_eq!(codes, vec![2001, 3001, 4002]);
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), CalibrationError> {
            Err(CalibrationError::InsufficientCalibrationData {
                required: 2,
                collected: 1,
            })
        }

        fn caller() -> Result<(), CalibrationError> {
            may_fail()?;
            Ok(())
        }

        assert!(caller().is_err());
    }

    #[test]
    fn test_session_error_delegates() {
        let err: SessionError = DetectionError::NotRunning.into();
        assert_eq!(err.code(), 3002);
        assert!(err.to_string().starts_with("DetectionError::NotRunning"));

        let err: SessionError = CalibrationError::StatePoisoned.into();
        assert_eq!(err.code(), 2007);
    }
}
