// Calibration module - whistle recording workflow and profile construction
//
// This module provides three main components:
// 1. CalibrationSample: one recording reduced to its dominant tone
// 2. WhistleProfile: frequency band and amplitude bounds built from samples
// 3. CalibrationProcedure: manages the recording workflow
//
// The calibration workflow:
// 1. Create CalibrationProcedure
// 2. Record the whistle (or enter its frequency) 2-3 times
// 3. Finalize to create the WhistleProfile

pub mod procedure;
pub mod profile;
pub mod progress;
pub mod sample;
pub mod validation;

pub use procedure::CalibrationProcedure;
pub use profile::WhistleProfile;
pub use progress::{CalibrationProgress, RecordingStatus};
pub use sample::{analyze_recording, CalibrationSample};
pub use validation::SampleValidator;
