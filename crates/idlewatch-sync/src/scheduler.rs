//! Sync scheduling: two triggers funneled into one serialized operation.
//!
//! A sync can become due two ways — the fixed-period heartbeat, or the
//! debounced tail of an activity burst. Both resolve through
//! [`SyncScheduler::wait_for_due`], and every dispatch passes the gate
//! in [`SyncScheduler::try_begin`], so there is exactly one sync path
//! regardless of trigger:
//!
//! - at most one sync in flight (a concurrent request is dropped, not
//!   queued)
//! - a minimum spacing equal to the debounce window between attempts,
//!   even when both triggers land close together

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::{SyncConfig, SyncSkip};

/// Which trigger made a sync due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The fixed-period heartbeat elapsed.
    Heartbeat,

    /// An activity burst went quiet for the debounce window.
    ActivityDebounce,
}

/// Deadlines and the single-flight gate for the reconciler.
///
/// Owned by the coordinator task; the actual network call runs in a
/// detached task, reporting back so [`complete`](Self::complete) can
/// clear the gate.
pub struct SyncScheduler {
    config: SyncConfig,
    next_heartbeat: Option<Instant>,
    debounce_at: Option<Instant>,
    last_attempt: Option<Instant>,
    in_flight: bool,
}

impl SyncScheduler {
    /// Creates a stopped scheduler from config.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config: config.validated(),
            next_heartbeat: None,
            debounce_at: None,
            last_attempt: None,
            in_flight: false,
        }
    }

    /// Arms the heartbeat. The first fire carries random jitter so
    /// coordinators started together spread out. Idempotent: starting
    /// an armed schedule keeps the existing deadline.
    pub fn start(&mut self) {
        if self.next_heartbeat.is_some() {
            return;
        }
        let jitter = if self.config.initial_jitter_ms > 0 {
            let ms = rand::rng().random_range(0..self.config.initial_jitter_ms);
            Duration::from_millis(ms)
        } else {
            Duration::ZERO
        };
        self.next_heartbeat =
            Some(Instant::now() + self.config.heartbeat_interval + jitter);
        debug!(
            interval_secs = self.config.heartbeat_interval.as_secs(),
            "sync schedule started"
        );
    }

    /// Cancels the heartbeat and any pending debounce. Idempotent.
    ///
    /// The in-flight flag is left alone — a response already on the
    /// wire still gets accounted for by `complete`.
    pub fn stop(&mut self) {
        if self.next_heartbeat.is_some() || self.debounce_at.is_some() {
            debug!("sync schedule stopped");
        }
        self.next_heartbeat = None;
        self.debounce_at = None;
    }

    /// Whether the heartbeat is armed.
    pub fn is_started(&self) -> bool {
        self.next_heartbeat.is_some()
    }

    /// (Re)arms the debounce deadline after a recorded activity bump.
    ///
    /// Each call pushes the deadline out again, so a burst coalesces
    /// into one sync `debounce` after its last bump. No-op while
    /// stopped.
    pub fn note_activity(&mut self) {
        if self.next_heartbeat.is_none() {
            return;
        }
        self.debounce_at = Some(Instant::now() + self.config.debounce);
        trace!("sync debounce (re)armed");
    }

    /// Waits until either trigger is due.
    ///
    /// The earlier deadline wins. A heartbeat fire re-arms the next
    /// heartbeat; a debounce fire consumes the debounce. Pends forever
    /// while stopped, so `select!` keeps servicing other branches.
    ///
    /// Cancellation-safe: deadlines only change after one actually
    /// elapses.
    pub async fn wait_for_due(&mut self) -> SyncTrigger {
        let (at, trigger) = match (self.debounce_at, self.next_heartbeat) {
            (Some(d), Some(h)) if d <= h => (d, SyncTrigger::ActivityDebounce),
            (_, Some(h)) => (h, SyncTrigger::Heartbeat),
            (Some(d), None) => (d, SyncTrigger::ActivityDebounce),
            (None, None) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(at).await;

        match trigger {
            SyncTrigger::ActivityDebounce => {
                self.debounce_at = None;
            }
            SyncTrigger::Heartbeat => {
                self.next_heartbeat =
                    Some(Instant::now() + self.config.heartbeat_interval);
            }
        }
        trace!(?trigger, "sync due");
        trigger
    }

    /// The gate in front of every dispatch: single-flight plus minimum
    /// spacing. On `Ok` the caller must eventually call
    /// [`complete`](Self::complete).
    pub fn try_begin(&mut self) -> Result<(), SyncSkip> {
        if self.in_flight {
            return Err(SyncSkip::InFlight);
        }
        if let Some(last) = self.last_attempt {
            if last.elapsed() < self.config.debounce {
                return Err(SyncSkip::TooSoon);
            }
        }
        self.in_flight = true;
        self.last_attempt = Some(Instant::now());
        Ok(())
    }

    /// Clears the in-flight flag once the outstanding sync resolved,
    /// successfully or not.
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Whether a sync is currently outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The validated configuration this scheduler runs with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}
