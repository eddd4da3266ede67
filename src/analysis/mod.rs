// Analysis module - per-frame whistle detection pipeline
//
// Pipeline: FeatureExtractor → FrameClassifier → WhistleDetector
//
// - features: magnitude spectrum to FeatureRecord (plus the PCM analyser)
// - classifier: one record against the calibrated profile
// - detector: sliding pattern window, sustained counter and cooldown

pub mod classifier;
pub mod detector;
pub mod features;

pub use classifier::{FrameClassifier, MatchVerdict};
pub use detector::{DetectionSnapshot, WhistleDetection, WhistleDetector};
pub use features::{DominantPeak, FeatureExtractor, FeatureRecord, SpectrumAnalyser};
