// Monotonic millisecond clocks for session timestamps
//
// Spectrum frames carry their own timestamps; the session only reads the
// clock to stamp samples and the start of a recording or detection session.
// A start on a different time base than the frames is re-anchored on the
// first frame, so any clock works; a clock on the frames' base keeps starts
// exact.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source in milliseconds
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the source was created, backed by `Instant`
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Deterministic time source driven by the caller
///
/// Used when frames come from a file: the driver sets the clock to each
/// frame's timestamp before handing the frame to the session.
#[derive(Debug, Default)]
pub struct StubTimeSource {
    now_ms: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock to `now_ms`; earlier values are ignored
    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.fetch_max(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for StubTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
