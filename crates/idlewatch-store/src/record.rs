//! The persisted session record.

use serde::{Deserialize, Serialize};

use crate::SessionConfig;

/// The canonical local record of an authenticated session.
///
/// This is the single object that survives a page reload / process
/// restart: it is serialized as-is into storage and must round-trip
/// exactly. Everything else (scheduled timers, sync deadlines) is
/// ephemeral and recomputed from this record.
///
/// Owned exclusively by the [`SessionStore`](crate::SessionStore); no
/// other component writes it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Epoch milliseconds of the most recent recorded activity.
    /// Monotonically non-decreasing while the session is active.
    pub last_activity_ms: u64,

    /// Current timing policy.
    pub config: SessionConfig,

    /// `false` once the session has expired or been ended.
    pub is_active: bool,
}

impl SessionRecord {
    /// A fresh record for a session beginning at `now_ms`.
    pub fn new(config: SessionConfig, now_ms: u64) -> Self {
        Self {
            last_activity_ms: now_ms,
            config,
            is_active: true,
        }
    }

    /// Milliseconds of idle time accumulated at `now_ms`.
    /// Saturates at zero if the clock appears to have gone backwards.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    /// The configured idle budget in milliseconds.
    pub fn idle_timeout_ms(&self) -> u64 {
        self.config.idle_timeout().as_millis() as u64
    }

    /// Milliseconds of idle budget left at `now_ms` (zero when spent).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.idle_timeout_ms().saturating_sub(self.elapsed_ms(now_ms))
    }

    /// Whether the idle budget is spent at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) >= self.idle_timeout_ms()
    }

    /// Epoch milliseconds at which the session expires, as derived from
    /// local state. Compared against the authority's view during sync.
    pub fn expires_at_ms(&self) -> u64 {
        self.last_activity_ms.saturating_add(self.idle_timeout_ms())
    }
}
