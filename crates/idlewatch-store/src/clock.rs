//! Epoch-anchored clock.
//!
//! Session timestamps are persisted as epoch milliseconds so they
//! survive a restart, but scheduling runs on the Tokio clock. `Clock`
//! bridges the two: it captures the wall-clock epoch once and advances
//! it with the Tokio monotonic clock. Under `tokio::time::pause()` the
//! whole thing is driven by `tokio::time::advance`, which is what makes
//! the timing tests deterministic.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Epoch-ms clock advanced by Tokio time.
///
/// Cloning copies the anchor, so clones tick in lockstep.
#[derive(Debug, Clone)]
pub struct Clock {
    epoch_anchor_ms: u64,
    started: Instant,
}

impl Clock {
    /// A clock anchored to the current wall-clock time.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let epoch_anchor_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::anchored(epoch_anchor_ms)
    }

    /// A clock anchored to a fixed epoch. Tests pin the anchor so
    /// restored-record arithmetic is exact.
    pub fn anchored(epoch_anchor_ms: u64) -> Self {
        Self {
            epoch_anchor_ms,
            started: Instant::now(),
        }
    }

    /// Current time in epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.epoch_anchor_ms + self.started.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
