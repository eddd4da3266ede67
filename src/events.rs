// Events emitted by a whistle counting session
//
// The session layer never talks to a UI directly. It pushes WhistleEvents to
// an EventSink; the broadcast channel manager is the default sink.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::calibration::CalibrationSample;

/// Event emitted by the session layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WhistleEvent {
    /// A whistle was counted; `count` includes it
    WhistleDetected { count: u32, timestamp_ms: u64 },
    /// A calibration recording finished; `None` when no clear whistle was heard
    CalibrationSampleRecorded { sample: Option<CalibrationSample> },
    /// The count reached the session's target; detection has stopped
    TargetReached { count: u32, timestamp_ms: u64 },
}

/// Receiver of session events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WhistleEvent);
}

impl EventSink for broadcast::Sender<WhistleEvent> {
    fn emit(&self, event: WhistleEvent) {
        // No subscribers is not an error
        if self.send(event).is_err() {
            log::debug!("[Events] Event dropped, no subscribers");
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WhistleEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    pub fn events(&self) -> Vec<WhistleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Remove and return the events received so far
    pub fn drain(&self) -> Vec<WhistleEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WhistleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
