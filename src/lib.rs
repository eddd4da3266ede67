// Whistle Counter Core - pressure-cooker whistle detection
// Spectrum features, calibration, sustained-pattern detection and profile storage

// Module declarations
pub mod analysis;
pub mod audio;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod managers;
pub mod store;

// Re-exports for convenience
pub use analysis::{
    DetectionSnapshot, FeatureExtractor, FeatureRecord, FrameClassifier, MatchVerdict,
    SpectrumAnalyser, WhistleDetection, WhistleDetector,
};
pub use audio::{PcmSpectrumSource, SpectrumFrame, SpectrumSource};
pub use calibration::{CalibrationProcedure, CalibrationSample, WhistleProfile};
pub use config::AppConfig;
pub use context::{FrameOutcome, WhistleCounter};
pub use error::{CalibrationError, DetectionError, ErrorCode, SessionError, StoreError};
pub use events::{EventSink, WhistleEvent};
pub use store::{NamedProfile, ProfileStore, SaveOutcome};
