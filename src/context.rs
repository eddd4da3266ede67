// WhistleCounter: session context for calibration, counting and profiles
// Centralizes session state so embedding shells and the CLI drive one object

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::analysis::detector::DetectionSnapshot;
use crate::analysis::features::FeatureExtractor;
use crate::audio::SpectrumFrame;
use crate::calibration::{CalibrationProgress, CalibrationSample, RecordingStatus, WhistleProfile};
use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::AppConfig;
use crate::error::{
    log_detection_error, log_store_error, CalibrationError, DetectionError, SessionError,
    StoreError,
};
use crate::events::{EventSink, WhistleEvent};
use crate::managers::{BroadcastChannelManager, CalibrationManager, DetectionManager};
use crate::store::{NamedProfile, ProfileStore, SaveOutcome};

/// What happened to one spectrum frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Neither calibration nor detection is active
    Idle,
    /// Frame went to the calibration session
    Calibrating(RecordingStatus),
    /// Recording window elapsed; the recording was analysed
    SampleRecorded(Option<CalibrationSample>),
    /// Frame went to the detector without completing a whistle
    Listening,
    /// A whistle was counted
    WhistleCounted { count: u32, target_reached: bool },
}

#[derive(Debug, Default)]
struct CounterState {
    active_profile: Option<WhistleProfile>,
    /// Store name of the active profile, when it came from the store
    active_name: Option<String>,
    count: u32,
    target: Option<u32>,
}

/// WhistleCounter: one kitchen's counting session
///
/// Calibration and detection are mutually exclusive: starting one stops the
/// other. Events go to the configured EventSink (the broadcast channel by
/// default).
pub struct WhistleCounter {
    config: AppConfig,
    extractor: FeatureExtractor,
    calibration: CalibrationManager,
    detection: DetectionManager,
    broadcast: Arc<BroadcastChannelManager>,
    sink: Arc<dyn EventSink>,
    store: ProfileStore,
    clock: Arc<dyn TimeSource>,
    state: Mutex<CounterState>,
}

impl WhistleCounter {
    /// Create a session over `store` with the system clock
    ///
    /// Recording windows and the detection cooldown run on frame timestamps.
    /// The clock stamps samples and the moment recording or detection starts;
    /// when it disagrees with the frames, the first frame after a start
    /// re-anchors the recording window and the cooldown.
    pub fn new(config: AppConfig, store: ProfileStore) -> Self {
        let broadcast = Arc::new(BroadcastChannelManager::new());
        let sink: Arc<dyn EventSink> = broadcast.clone();
        if let Some(err) = store.load_error() {
            log::warn!("[WhistleCounter] Saved profiles unavailable: {}", err);
        }

        Self {
            extractor: FeatureExtractor::new(config.features.clone()),
            calibration: CalibrationManager::new(
                config.calibration.clone(),
                config.features.clone(),
            ),
            detection: DetectionManager::new(config.classifier.clone(), config.detection.clone()),
            broadcast,
            sink,
            store,
            clock: Arc::new(SystemTimeSource::new()),
            state: Mutex::new(CounterState::default()),
            config,
        }
    }

    /// Replace the clock used to stamp recordings and detection starts
    ///
    /// Use a clock on the frames' time base (a [`StubTimeSource`] set from
    /// each frame's timestamp for file playback) to keep start times exact.
    ///
    /// [`StubTimeSource`]: crate::clock::StubTimeSource
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Send events to `sink` instead of the broadcast channel
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Subscribe to the broadcast event channel
    pub fn subscribe_events(&self) -> Option<broadcast::Receiver<WhistleEvent>> {
        self.broadcast.subscribe_events()
    }

    /// Broadcast events as a `futures::Stream`
    pub fn event_stream(&self) -> Option<BroadcastStream<WhistleEvent>> {
        self.broadcast.event_stream()
    }

    // ========================================================================
    // CALIBRATION
    // ========================================================================

    /// Start calibrating
    ///
    /// Stops detection and clears the active profile; the new profile becomes
    /// active on [`WhistleCounter::finish_calibration`].
    pub fn start_calibration(&self) -> Result<(), CalibrationError> {
        self.detection
            .stop()
            .map_err(|_| CalibrationError::StatePoisoned)?;
        {
            let mut state = self.lock_state().map_err(|_| CalibrationError::StatePoisoned)?;
            state.active_profile = None;
            state.active_name = None;
        }
        self.calibration.start()?;
        log::info!("[WhistleCounter] Calibration started");
        Ok(())
    }

    pub fn start_recording(&self) -> Result<(), CalibrationError> {
        self.calibration.start_recording(self.clock.now_ms())
    }

    /// Stop the running recording and analyse it
    ///
    /// Emits `CalibrationSampleRecorded` with the sample, or with `None` when
    /// no clear whistle was heard.
    pub fn stop_recording(&self) -> Result<CalibrationSample, CalibrationError> {
        let result = self.calibration.stop_recording(self.clock.now_ms());
        match &result {
            Ok(sample) => self.sink.emit(WhistleEvent::CalibrationSampleRecorded {
                sample: Some(*sample),
            }),
            Err(CalibrationError::NoSignalDetected) => self
                .sink
                .emit(WhistleEvent::CalibrationSampleRecorded { sample: None }),
            Err(_) => {}
        }
        result
    }

    /// Add a sample from a manually entered frequency
    pub fn add_manual_sample(&self, frequency: f32) -> Result<CalibrationSample, CalibrationError> {
        let sample = self
            .calibration
            .add_manual_sample(frequency, self.clock.now_ms())?;
        self.sink.emit(WhistleEvent::CalibrationSampleRecorded {
            sample: Some(sample),
        });
        Ok(sample)
    }

    pub fn calibration_progress(&self) -> Result<Option<CalibrationProgress>, CalibrationError> {
        self.calibration.progress()
    }

    /// Build the profile and make it active
    pub fn finish_calibration(&self) -> Result<WhistleProfile, CalibrationError> {
        let profile = self.calibration.finish()?;
        let mut state = self.lock_state().map_err(|_| CalibrationError::StatePoisoned)?;
        state.active_profile = Some(profile.clone());
        state.active_name = None;
        Ok(profile)
    }

    pub fn cancel_calibration(&self) -> Result<bool, CalibrationError> {
        self.calibration.cancel()
    }

    pub fn is_calibrating(&self) -> Result<bool, CalibrationError> {
        self.calibration.is_active()
    }

    // ========================================================================
    // DETECTION
    // ========================================================================

    /// Arm detection against the active profile and reset the count
    ///
    /// # Arguments
    /// * `target` - Whistle count at which detection stops; `None` or 0 counts forever
    ///
    /// # Errors
    /// * `DetectionError::NoActiveProfile` - Calibrate or load a profile first
    pub fn start_detection(&self, target: Option<u32>) -> Result<(), DetectionError> {
        let profile = {
            let mut state = self.lock_state()?;
            let profile = state
                .active_profile
                .clone()
                .ok_or(DetectionError::NoActiveProfile)
                .inspect_err(|err| log_detection_error(err, "start_detection"))?;
            state.count = 0;
            state.target = target.filter(|t| *t > 0);
            profile
        };

        self.calibration
            .cancel()
            .map_err(|_| DetectionError::StatePoisoned)?;
        self.detection.start(profile, self.clock.now_ms())?;

        log::info!(
            "[WhistleCounter] Detection started, target={:?}",
            target.filter(|t| *t > 0)
        );
        Ok(())
    }

    pub fn stop_detection(&self) -> Result<bool, DetectionError> {
        self.detection.stop()
    }

    pub fn is_detecting(&self) -> Result<bool, DetectionError> {
        self.detection.is_running()
    }

    pub fn reset_counter(&self) -> Result<(), DetectionError> {
        self.lock_state()?.count = 0;
        Ok(())
    }

    pub fn count(&self) -> Result<u32, DetectionError> {
        Ok(self.lock_state()?.count)
    }

    pub fn target(&self) -> Result<Option<u32>, DetectionError> {
        Ok(self.lock_state()?.target)
    }

    pub fn detection_snapshot(&self) -> Result<DetectionSnapshot, DetectionError> {
        self.detection.snapshot()
    }

    // ========================================================================
    // FRAME ROUTING
    // ========================================================================

    /// Route one spectrum frame to the active session
    pub fn process_frame(&self, frame: &SpectrumFrame) -> Result<FrameOutcome, SessionError> {
        let record = self
            .extractor
            .extract(&frame.magnitudes, frame.sample_rate, frame.timestamp_ms);

        if self.calibration.is_active()? {
            let status = self.calibration.push_frame(record)?;
            if !status.is_window_elapsed() {
                return Ok(FrameOutcome::Calibrating(status));
            }

            tracing::debug!(timestamp_ms = frame.timestamp_ms, "recording window elapsed");
            return match self.stop_recording() {
                Ok(sample) => Ok(FrameOutcome::SampleRecorded(Some(sample))),
                Err(CalibrationError::NoSignalDetected) => Ok(FrameOutcome::SampleRecorded(None)),
                Err(err) => Err(err.into()),
            };
        }

        let detection = match self.detection.process(record) {
            Ok(detection) => detection,
            Err(DetectionError::NotRunning) => return Ok(FrameOutcome::Idle),
            Err(err) => return Err(err.into()),
        };

        let detection = match detection {
            Some(detection) => detection,
            None => return Ok(FrameOutcome::Listening),
        };

        let (count, target_reached) = {
            let mut state = self.lock_state()?;
            state.count += 1;
            let reached = state.target.is_some_and(|target| state.count >= target);
            (state.count, reached)
        };

        tracing::info!(count, timestamp_ms = detection.timestamp_ms, "whistle counted");
        self.sink.emit(WhistleEvent::WhistleDetected {
            count,
            timestamp_ms: detection.timestamp_ms,
        });

        if target_reached {
            log::info!("[WhistleCounter] Target of {} whistles reached", count);
            self.sink.emit(WhistleEvent::TargetReached {
                count,
                timestamp_ms: detection.timestamp_ms,
            });
            self.detection.stop()?;
        }

        Ok(FrameOutcome::WhistleCounted {
            count,
            target_reached,
        })
    }

    // ========================================================================
    // PROFILES
    // ========================================================================

    pub fn active_profile(&self) -> Result<Option<WhistleProfile>, DetectionError> {
        Ok(self.lock_state()?.active_profile.clone())
    }

    /// Make `profile` active, resetting an armed detector
    pub fn set_active_profile(&self, profile: WhistleProfile) -> Result<(), DetectionError> {
        self.activate(profile, None)
    }

    /// Save the active profile under `name`
    ///
    /// # Errors
    /// * `StoreError::NothingToSave` - No active profile
    /// * `StoreError::ProfileNameRequired` - Blank name
    pub fn save_profile(&self, name: &str) -> Result<SaveOutcome, StoreError> {
        let profile = self
            .lock_state()
            .map_err(|_| StoreError::StatePoisoned)?
            .active_profile
            .clone()
            .ok_or(StoreError::NothingToSave)
            .inspect_err(|err| log_store_error(err, "save_profile"))?;

        let outcome = self.store.put(name, profile)?;
        self.lock_state()
            .map_err(|_| StoreError::StatePoisoned)?
            .active_name = Some(name.trim().to_string());
        Ok(outcome)
    }

    /// Load the profile saved under `name` and make it active
    ///
    /// # Errors
    /// * `StoreError::ProfileNameRequired` - Blank name
    /// * `StoreError::ProfileNotFound` - Nothing saved under `name`
    pub fn load_profile(&self, name: &str) -> Result<WhistleProfile, StoreError> {
        let entry = self
            .store
            .get(name)
            .inspect_err(|err| log_store_error(err, "load_profile"))?
            .ok_or_else(|| StoreError::ProfileNotFound {
                name: name.to_string(),
            })
            .inspect_err(|err| log_store_error(err, "load_profile"))?;

        self.activate(entry.profile.clone(), Some(entry.name.clone()))
            .map_err(|_| StoreError::StatePoisoned)?;
        log::info!("[WhistleCounter] Profile \"{}\" loaded", entry.name);
        Ok(entry.profile)
    }

    /// Delete the profile saved under `name`
    ///
    /// Deleting the active profile clears it and stops detection.
    pub fn delete_profile(&self, name: &str) -> Result<(), StoreError> {
        let deleted = self
            .store
            .delete(name)
            .inspect_err(|err| log_store_error(err, "delete_profile"))?;
        if !deleted {
            let err = StoreError::ProfileNotFound {
                name: name.to_string(),
            };
            log_store_error(&err, "delete_profile");
            return Err(err);
        }

        let was_active = {
            let mut state = self.lock_state().map_err(|_| StoreError::StatePoisoned)?;
            let was_active = state
                .active_name
                .as_deref()
                .is_some_and(|active| active.to_lowercase() == name.trim().to_lowercase());
            if was_active {
                state.active_profile = None;
                state.active_name = None;
            }
            was_active
        };

        if was_active {
            log::info!("[WhistleCounter] Active profile deleted, detection stopped");
            self.detection
                .stop()
                .map_err(|_| StoreError::StatePoisoned)?;
        }
        Ok(())
    }

    /// Saved profiles in listing order
    pub fn list_profiles(&self) -> Result<Vec<NamedProfile>, StoreError> {
        self.store.list()
    }

    pub fn profile_names(&self) -> Result<Vec<String>, StoreError> {
        self.store.names()
    }

    // ========================================================================
    // HELPER METHODS
    // ========================================================================

    fn activate(&self, profile: WhistleProfile, name: Option<String>) -> Result<(), DetectionError> {
        {
            let mut state = self.lock_state()?;
            state.active_profile = Some(profile.clone());
            state.active_name = name;
        }
        self.detection.rearm(profile, self.clock.now_ms())?;
        Ok(())
    }

    /// Safely acquire lock on the counter state
    fn lock_state(&self) -> Result<MutexGuard<'_, CounterState>, DetectionError> {
        self.state.lock().map_err(|_| DetectionError::StatePoisoned)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
