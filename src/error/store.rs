// Profile store error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Profile store error code constants
///
/// Error code range: 4001-4005
pub struct StoreErrorCodes {}

impl StoreErrorCodes {
    /// No profile is stored under the requested name
    pub const PROFILE_NOT_FOUND: i32 = 4001;

    /// Empty or whitespace-only profile name
    pub const PROFILE_NAME_REQUIRED: i32 = 4002;

    /// Persistence backend failed to read or write
    pub const STORE_UNAVAILABLE: i32 = 4003;

    /// Save requested without an active profile
    pub const NOTHING_TO_SAVE: i32 = 4004;

    /// Store lock was poisoned
    pub const STATE_POISONED: i32 = 4005;
}

/// Log a store error with structured context
pub fn log_store_error(err: &StoreError, context: &str) {
    error!(
        "Store error in {}: code={}, component=ProfileStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Profile persistence errors
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Lookup, load or delete of an unknown name
    ProfileNotFound { name: String },

    /// Name missing or blank
    ProfileNameRequired,

    /// Backend read/write failure (storage full, corrupted data, I/O)
    StoreUnavailable { reason: String },

    /// There is no active profile to save
    NothingToSave,

    /// Store lock was poisoned
    StatePoisoned,
}

impl ErrorCode for StoreError {
    fn code(&self) -> i32 {
        match self {
            StoreError::ProfileNotFound { .. } => StoreErrorCodes::PROFILE_NOT_FOUND,
            StoreError::ProfileNameRequired => StoreErrorCodes::PROFILE_NAME_REQUIRED,
            StoreError::StoreUnavailable { .. } => StoreErrorCodes::STORE_UNAVAILABLE,
            StoreError::NothingToSave => StoreErrorCodes::NOTHING_TO_SAVE,
            StoreError::StatePoisoned => StoreErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            StoreError::ProfileNotFound { name } => format!("Profile \"{}\" not found.", name),
            StoreError::ProfileNameRequired => "Please enter a name for the profile.".to_string(),
            StoreError::StoreUnavailable { reason } => {
                format!("Profile storage unavailable: {}", reason)
            }
            StoreError::NothingToSave => {
                "No whistle profile to save. Please calibrate first.".to_string()
            }
            StoreError::StatePoisoned => "Profile store lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StoreError {}

/// Convert from std::io::Error to StoreError
impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Convert from serde_json::Error to StoreError
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::StoreUnavailable {
            reason: format!("corrupted profile data: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        assert_eq!(
            StoreError::ProfileNotFound {
                name: "x".to_string()
            }
            .code(),
            4001
        );
        assert_eq!(StoreError::ProfileNameRequired.code(), 4002);
        assert_eq!(
            StoreError::StoreUnavailable {
                reason: "disk full".to_string()
            }
            .code(),
            4003
        );
        assert_eq!(StoreError::NothingToSave.code(), 4004);
        assert_eq!(StoreError::StatePoisoned.code(), 4005);
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::ProfileNotFound {
            name: "Kitchen".to_string(),
        };
        assert_eq!(err.message(), "Profile \"Kitchen\" not found.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let store_err: StoreError = io_err.into();

        match store_err {
            StoreError::StoreUnavailable { reason } => {
                assert!(reason.contains("read-only"));
            }
            other => panic!("Expected StoreUnavailable variant, got {:?}", other),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("{not json").unwrap_err();
        let store_err: StoreError = json_err.into();
        assert!(store_err.message().contains("corrupted"));
    }
}
