//! Warning/expiry timer scheduling for Idlewatch.
//!
//! Two deadlines derived from the last-activity time — a warning and an
//! expiry — armed together and fired in order from a single async wait.
//! The deadlines are plain fields, so "cancel any previous timer before
//! arming a new one" is simply overwriting them: there is no way for two
//! live expiry timers to race.
//!
//! # Integration
//!
//! [`IdleTimers::wait_for_fire`] is designed to sit inside the
//! coordinator's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* handle commands */ }
//!         fire = timers.wait_for_fire() => match fire {
//!             TimerFire::Warning { lead_minutes } => events.on_warning(lead_minutes),
//!             TimerFire::Expiry => { /* expire the session */ }
//!         }
//!     }
//! }
//! ```
//!
//! With nothing armed the wait pends forever, so `select!` keeps
//! servicing the other branches.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// TimerState
// ---------------------------------------------------------------------------

/// Lifecycle of the scheduled timers.
///
/// ```text
/// Idle ──(arm)──→ Armed ──(warning fires)──→ Warned ──(expiry fires)──→ Expired
///   ↑               ↑ └──────────(re-arm on activity/config)──────┐        │
///   │               └─────────────────────────────────────────────┘        │
///   └───────────────────────────(disarm)───────────────────────────────────┘
/// ```
///
/// - **Idle**: no session; nothing armed.
/// - **Armed**: expiry (and usually warning) deadlines outstanding.
/// - **Warned**: warning fired; expiry still outstanding. Re-arming
///   returns to Armed.
/// - **Expired**: expiry fired. The coordinator holds the state here
///   until a new session begins — activity on an expired session is
///   ignored upstream, so no re-arm reaches an Expired timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed,
    Warned,
    Expired,
}

impl TimerState {
    /// Returns `true` while any deadline is outstanding.
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed | Self::Warned)
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Armed => write!(f, "Armed"),
            Self::Warned => write!(f, "Warned"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// TimerFire
// ---------------------------------------------------------------------------

/// A deadline elapsing, returned by [`IdleTimers::wait_for_fire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    /// The warning deadline elapsed. `lead_minutes` is the configured
    /// warning lead — the value the warning callback reports, not a
    /// live countdown; any countdown display is the consumer's job.
    Warning { lead_minutes: u32 },

    /// The expiry deadline elapsed.
    Expiry,
}

// ---------------------------------------------------------------------------
// IdleTimers
// ---------------------------------------------------------------------------

/// The two idle deadlines and their state machine.
pub struct IdleTimers {
    state: TimerState,
    warning_at: Option<Instant>,
    expiry_at: Option<Instant>,
    /// Captured at arm time so the warning reports the lead it was
    /// armed with even if config changes before it fires (a config
    /// change re-arms anyway).
    lead_minutes: u32,
}

impl IdleTimers {
    /// Creates an idle (unarmed) timer pair.
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            warning_at: None,
            expiry_at: None,
            lead_minutes: 0,
        }
    }

    /// Arms both deadlines relative to idle time already `elapsed`.
    ///
    /// `warning_lead_minutes` of zero, or at or above the timeout,
    /// arms expiry only. Overwriting the previous deadlines is the
    /// cancellation — at most one warning and one expiry deadline exist
    /// afterwards.
    ///
    /// `elapsed` may already exceed a deadline (a record restored after
    /// the process was gone a while); the deadline lands in the past
    /// and fires on the next wait.
    pub fn arm(
        &mut self,
        idle_timeout: Duration,
        warning_lead_minutes: u32,
        elapsed: Duration,
    ) {
        let now = Instant::now();
        let warning_lead =
            Duration::from_secs(u64::from(warning_lead_minutes) * 60);

        self.expiry_at = Some(now + idle_timeout.saturating_sub(elapsed));

        self.warning_at = if !warning_lead.is_zero() && warning_lead < idle_timeout {
            let warning_delay = idle_timeout - warning_lead;
            Some(now + warning_delay.saturating_sub(elapsed))
        } else {
            if warning_lead_minutes > 0 {
                debug!(
                    warning_lead_minutes,
                    timeout_secs = idle_timeout.as_secs(),
                    "warning lead at or above idle timeout — expiry only"
                );
            }
            None
        };

        self.lead_minutes = warning_lead_minutes;
        self.state = TimerState::Armed;
        debug!(
            expiry_in_secs = idle_timeout.saturating_sub(elapsed).as_secs(),
            warning_armed = self.warning_at.is_some(),
            "timers armed"
        );
    }

    /// Waits for the next outstanding deadline.
    ///
    /// Warning always precedes expiry when both are armed, so the
    /// nearest deadline is the first `Some` in order. With nothing
    /// armed this pends forever — `select!` handles other branches.
    ///
    /// Cancellation-safe: state only changes after a deadline actually
    /// elapses, so a `select!` that takes another branch mid-wait
    /// leaves the deadlines intact for the next call.
    pub async fn wait_for_fire(&mut self) -> TimerFire {
        if let Some(at) = self.warning_at {
            time::sleep_until(at).await;
            self.warning_at = None;
            self.state = TimerState::Warned;
            trace!(lead_minutes = self.lead_minutes, "warning timer fired");
            return TimerFire::Warning {
                lead_minutes: self.lead_minutes,
            };
        }

        if let Some(at) = self.expiry_at {
            time::sleep_until(at).await;
            self.expiry_at = None;
            self.state = TimerState::Expired;
            trace!("expiry timer fired");
            return TimerFire::Expiry;
        }

        std::future::pending::<()>().await;
        unreachable!()
    }

    /// Cancels both deadlines and returns to `Idle`. Idempotent.
    pub fn disarm(&mut self) {
        if self.state != TimerState::Idle {
            debug!(from = %self.state, "timers disarmed");
        }
        self.warning_at = None;
        self.expiry_at = None;
        self.state = TimerState::Idle;
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Returns `true` while any deadline is outstanding.
    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }
}

impl Default for IdleTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_state_is_armed() {
        assert!(!TimerState::Idle.is_armed());
        assert!(TimerState::Armed.is_armed());
        assert!(TimerState::Warned.is_armed());
        assert!(!TimerState::Expired.is_armed());
    }

    #[test]
    fn test_timer_state_display() {
        assert_eq!(TimerState::Idle.to_string(), "Idle");
        assert_eq!(TimerState::Expired.to_string(), "Expired");
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_skips_warning_when_lead_is_zero() {
        let mut timers = IdleTimers::new();
        timers.arm(Duration::from_secs(900), 0, Duration::ZERO);

        assert!(timers.warning_at.is_none());
        assert!(timers.expiry_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_skips_warning_when_lead_reaches_timeout() {
        let mut timers = IdleTimers::new();
        timers.arm(Duration::from_secs(900), 15, Duration::ZERO);

        assert!(timers.warning_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_overwrites_deadlines() {
        let mut timers = IdleTimers::new();
        timers.arm(Duration::from_secs(900), 2, Duration::ZERO);
        let first_expiry = timers.expiry_at;

        tokio::time::advance(Duration::from_secs(600)).await;
        timers.arm(Duration::from_secs(900), 2, Duration::ZERO);

        assert_ne!(timers.expiry_at, first_expiry);
        assert_eq!(timers.state(), TimerState::Armed);
    }
}
