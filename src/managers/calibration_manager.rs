// CalibrationManager: Focused manager for the calibration workflow
//
// Single Responsibility: Calibration procedure lifecycle
// Owns the in-progress CalibrationProcedure behind a mutex; the resulting
// profile is handed back to the caller on finish.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::analysis::features::FeatureRecord;
use crate::calibration::{
    CalibrationProcedure, CalibrationProgress, CalibrationSample, RecordingStatus, WhistleProfile,
};
use crate::config::{CalibrationConfig, FeatureConfig};
use crate::error::{log_calibration_error, CalibrationError};

/// Manages the calibration workflow
///
/// This manager handles:
/// - Starting, cancelling and finishing a calibration session
/// - Starting and stopping recordings
/// - Manual frequency entry
/// - Thread-safe lock management
pub struct CalibrationManager {
    procedure: Arc<Mutex<Option<CalibrationProcedure>>>,
    config: CalibrationConfig,
    bands: FeatureConfig,
}

impl CalibrationManager {
    /// Create a new CalibrationManager with no calibration in progress
    pub fn new(config: CalibrationConfig, bands: FeatureConfig) -> Self {
        Self {
            procedure: Arc::new(Mutex::new(None)),
            config,
            bands,
        }
    }

    /// Start a calibration session, discarding any previous one
    pub fn start(&self) -> Result<(), CalibrationError> {
        let mut guard = self.lock_procedure()?;
        if guard.is_some() {
            log::info!("[CalibrationManager] Restarting calibration, previous samples discarded");
        }
        *guard = Some(CalibrationProcedure::new(
            self.config.clone(),
            self.bands.clone(),
        ));
        Ok(())
    }

    /// Abandon the calibration session
    ///
    /// # Returns
    /// `true` when a session was running
    pub fn cancel(&self) -> Result<bool, CalibrationError> {
        let mut guard = self.lock_procedure()?;
        Ok(guard.take().is_some())
    }

    pub fn is_active(&self) -> Result<bool, CalibrationError> {
        Ok(self.lock_procedure()?.is_some())
    }

    /// Begin a recording in the active session
    ///
    /// # Errors
    /// - `NotInProgress` when no session is active
    /// - `RecordingInProgress` when a recording is already running
    pub fn start_recording(&self, now_ms: u64) -> Result<(), CalibrationError> {
        self.with_procedure("start_recording", |procedure| {
            procedure.start_recording(now_ms)
        })
    }

    /// Feed a frame to the running recording
    ///
    /// Frames outside a session or a recording are ignored (`Idle`).
    pub fn push_frame(&self, record: FeatureRecord) -> Result<RecordingStatus, CalibrationError> {
        let mut guard = self.lock_procedure()?;
        Ok(match guard.as_mut() {
            Some(procedure) => procedure.push_frame(record),
            None => RecordingStatus::Idle,
        })
    }

    /// Stop the running recording and analyse it
    ///
    /// `NoSignalDetected` is an expected outcome and is not logged as an error.
    pub fn stop_recording(&self, now_ms: u64) -> Result<CalibrationSample, CalibrationError> {
        let mut guard = self.lock_procedure()?;
        let procedure = guard.as_mut().ok_or(CalibrationError::NotInProgress)?;
        procedure.stop_recording(now_ms).inspect_err(|err| {
            if *err != CalibrationError::NoSignalDetected {
                log_calibration_error(err, "stop_recording");
            }
        })
    }

    /// Add a sample from a manually entered frequency
    pub fn add_manual_sample(
        &self,
        frequency: f32,
        now_ms: u64,
    ) -> Result<CalibrationSample, CalibrationError> {
        self.with_procedure("add_manual_sample", |procedure| {
            procedure.add_manual_sample(frequency, now_ms)
        })
    }

    /// Progress of the active session, `None` when no session is active
    pub fn progress(&self) -> Result<Option<CalibrationProgress>, CalibrationError> {
        Ok(self.lock_procedure()?.as_ref().map(|p| p.progress()))
    }

    /// Finish calibration and build the profile
    ///
    /// The session ends only when the profile was built; on error the
    /// collected samples are kept so the user can record more.
    pub fn finish(&self) -> Result<WhistleProfile, CalibrationError> {
        let mut guard = self.lock_procedure()?;
        let procedure = match guard.as_ref() {
            Some(procedure) => procedure,
            None => {
                let err = CalibrationError::NotInProgress;
                log_calibration_error(&err, "finish_calibration");
                return Err(err);
            }
        };

        let profile = procedure.finalize().inspect_err(|err| {
            log_calibration_error(err, "finish_calibration");
        })?;
        *guard = None;
        Ok(profile)
    }

    // ========================================================================
    // HELPER METHODS - Lock management
    // ========================================================================

    /// Safely acquire lock on calibration procedure
    fn lock_procedure(
        &self,
    ) -> Result<MutexGuard<'_, Option<CalibrationProcedure>>, CalibrationError> {
        self.procedure
            .lock()
            .map_err(|_| CalibrationError::StatePoisoned)
    }

    /// Run `op` against the active procedure, logging failures
    fn with_procedure<T>(
        &self,
        context: &str,
        op: impl FnOnce(&mut CalibrationProcedure) -> Result<T, CalibrationError>,
    ) -> Result<T, CalibrationError> {
        let mut guard = self.lock_procedure()?;
        let result = match guard.as_mut() {
            Some(procedure) => op(procedure),
            None => Err(CalibrationError::NotInProgress),
        };
        result.inspect_err(|err| log_calibration_error(err, context))
    }
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(CalibrationConfig::default(), FeatureConfig::default())
    }
}
