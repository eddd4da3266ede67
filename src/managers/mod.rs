// Managers Module
//
// Focused manager classes used by the WhistleCounter session context.
//
// Each manager handles one specific concern:
// - CalibrationManager: Calibration workflow
// - DetectionManager: Armed detector lifecycle
// - BroadcastChannelManager: Tokio broadcast channel for session events

pub mod broadcast_manager;
pub mod calibration_manager;
pub mod detection_manager;

pub use broadcast_manager::BroadcastChannelManager;
pub use calibration_manager::CalibrationManager;
pub use detection_manager::DetectionManager;
