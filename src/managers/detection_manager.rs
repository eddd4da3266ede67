// DetectionManager: Focused manager for the armed whistle detector
//
// Single Responsibility: Detector lifecycle
// Holds at most one WhistleDetector. Stopping drops it; re-arming replaces it
// with a fresh one so no window or cooldown state carries over.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::analysis::classifier::FrameClassifier;
use crate::analysis::detector::{DetectionSnapshot, WhistleDetection, WhistleDetector};
use crate::analysis::features::FeatureRecord;
use crate::calibration::WhistleProfile;
use crate::config::{ClassifierConfig, DetectionConfig};
use crate::error::DetectionError;

/// Manages the armed detector
pub struct DetectionManager {
    detector: Arc<Mutex<Option<WhistleDetector>>>,
    classifier: FrameClassifier,
    config: DetectionConfig,
}

impl DetectionManager {
    /// Create a new DetectionManager with no detector armed
    pub fn new(classifier: ClassifierConfig, config: DetectionConfig) -> Self {
        Self {
            detector: Arc::new(Mutex::new(None)),
            classifier: FrameClassifier::new(classifier),
            config,
        }
    }

    /// Arm a fresh detector for `profile`, replacing any armed one
    pub fn start(&self, profile: WhistleProfile, now_ms: u64) -> Result<(), DetectionError> {
        let mut guard = self.lock_detector()?;
        *guard = Some(WhistleDetector::new(
            profile,
            self.classifier.clone(),
            self.config.clone(),
            now_ms,
        ));
        Ok(())
    }

    /// Disarm the detector
    ///
    /// # Returns
    /// `true` when a detector was armed
    pub fn stop(&self) -> Result<bool, DetectionError> {
        let stopped = self.lock_detector()?.take().is_some();
        if stopped {
            log::info!("[DetectionManager] Detection stopped");
        }
        Ok(stopped)
    }

    pub fn is_running(&self) -> Result<bool, DetectionError> {
        Ok(self.lock_detector()?.is_some())
    }

    /// Re-arm with `profile` if a detector is armed
    ///
    /// # Returns
    /// `true` when the detector was reset
    pub fn rearm(&self, profile: WhistleProfile, now_ms: u64) -> Result<bool, DetectionError> {
        let mut guard = self.lock_detector()?;
        if guard.is_none() {
            return Ok(false);
        }
        log::info!("[DetectionManager] Active profile changed, detector reset");
        *guard = Some(WhistleDetector::new(
            profile,
            self.classifier.clone(),
            self.config.clone(),
            now_ms,
        ));
        Ok(true)
    }

    /// Feed a record to the armed detector
    ///
    /// # Errors
    /// * `DetectionError::NotRunning` - No detector armed
    pub fn process(&self, record: FeatureRecord) -> Result<Option<WhistleDetection>, DetectionError> {
        let mut guard = self.lock_detector()?;
        let detector = guard.as_mut().ok_or(DetectionError::NotRunning)?;
        Ok(detector.process(record))
    }

    /// Diagnostic snapshot of the armed detector
    pub fn snapshot(&self) -> Result<DetectionSnapshot, DetectionError> {
        let guard = self.lock_detector()?;
        guard
            .as_ref()
            .map(|detector| detector.snapshot())
            .ok_or(DetectionError::NotRunning)
    }

    /// Safely acquire lock on the detector
    fn lock_detector(&self) -> Result<MutexGuard<'_, Option<WhistleDetector>>, DetectionError> {
        self.detector
            .lock()
            .map_err(|_| DetectionError::StatePoisoned)
    }
}

impl Default for DetectionManager {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), DetectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> WhistleProfile {
        WhistleProfile {
            target_frequency: 2000.0,
            min_frequency: 1920.0,
            max_frequency: 2080.0,
            min_amplitude: 105.0,
            max_amplitude: 300.0,
            sample_count: 3,
        }
    }

    #[test]
    fn test_lifecycle() {
        let manager = DetectionManager::default();
        assert!(!manager.is_running().unwrap());
        assert_eq!(
            manager.process(FeatureRecord::silent(0)),
            Err(DetectionError::NotRunning)
        );
        assert_eq!(manager.snapshot(), Err(DetectionError::NotRunning));

        manager.start(profile(), 0).unwrap();
        assert!(manager.is_running().unwrap());
        assert_eq!(manager.process(FeatureRecord::silent(16)), Ok(None));
        assert!(manager.snapshot().is_ok());

        assert!(manager.stop().unwrap());
        assert!(!manager.stop().unwrap());
    }

    #[test]
    fn test_rearm_only_when_running() {
        let manager = DetectionManager::default();
        assert!(!manager.rearm(profile(), 0).unwrap());
        assert!(!manager.is_running().unwrap());

        manager.start(profile(), 0).unwrap();
        for i in 0..5 {
            manager.process(FeatureRecord::silent(i * 16)).unwrap();
        }
        let mut wider = profile();
        wider.max_frequency = 2500.0;
        assert!(manager.rearm(wider, 100).unwrap());

        let snapshot = manager.snapshot().unwrap();
        assert_eq!(snapshot.profile_max_frequency, 2500.0);
        assert_eq!(snapshot.last_verdict, None);
    }
}
