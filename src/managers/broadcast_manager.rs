// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Event channel lifecycle and subscription

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::events::{EventSink, WhistleEvent};

/// Capacity of the session event channel
///
/// Whistles are at least 30 s apart, so the channel only fills if a
/// subscriber stops reading entirely.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Manages the session event broadcast channel
///
/// The channel is created lazily on first use; subscribers created before a
/// re-initialisation keep listening to the old channel.
pub struct BroadcastChannelManager {
    events: Arc<Mutex<Option<broadcast::Sender<WhistleEvent>>>>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with the channel uninitialized
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the event channel
    ///
    /// Replaces any existing channel.
    ///
    /// # Returns
    /// `Option<broadcast::Sender<WhistleEvent>>` - Sender, or None if the lock is poisoned
    pub fn init_events(&self) -> Option<broadcast::Sender<WhistleEvent>> {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut guard = self.events.lock().ok()?;
        *guard = Some(tx.clone());
        Some(tx)
    }

    /// Subscribe to session events, initialising the channel if needed
    ///
    /// # Returns
    /// `Option<broadcast::Receiver<WhistleEvent>>` - Receiver, or None if the lock is poisoned
    pub fn subscribe_events(&self) -> Option<broadcast::Receiver<WhistleEvent>> {
        let mut guard = self.events.lock().ok()?;
        let tx = guard.get_or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0);
        Some(tx.subscribe())
    }

    /// Session events as a `futures::Stream`
    ///
    /// Lagged subscribers see `Err(BroadcastStreamRecvError::Lagged)` items.
    pub fn event_stream(&self) -> Option<BroadcastStream<WhistleEvent>> {
        self.subscribe_events().map(BroadcastStream::new)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.events
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastChannelManager {
    fn emit(&self, event: WhistleEvent) {
        let sender = match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                log::error!("[BroadcastChannelManager] Event channel lock poisoned, event dropped");
                return;
            }
        };
        match sender {
            Some(tx) => tx.emit(event),
            None => log::debug!("[BroadcastChannelManager] Event channel not initialized"),
        }
    }
}
