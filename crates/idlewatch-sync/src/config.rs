//! Reconciler configuration.

use std::time::Duration;

use tracing::warn;

/// Tuning for the remote reconciler.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed period between heartbeat checks while a session is active.
    ///
    /// Default: 2 minutes.
    pub heartbeat_interval: Duration,

    /// Quiet window after an activity burst before a piggy-backed sync
    /// fires. Doubles as the minimum spacing between any two sync
    /// attempts, whichever trigger produced them.
    ///
    /// Default: 5 seconds.
    pub debounce: Duration,

    /// Divergence between local and remote expiry above which the
    /// drift is reported at warn level.
    ///
    /// Default: 30 seconds.
    pub drift_tolerance: Duration,

    /// Apply the drift correction instead of only reporting it.
    ///
    /// Ships **disabled**: the corrective branch is intentionally
    /// short-circuited pending a resolution of how aggressively local
    /// timers may chase the server's clock without re-arm storms. The
    /// comparison and logging run either way.
    pub correct_drift: bool,

    /// Random jitter (0–max ms) added to the *first* heartbeat so a
    /// fleet of coordinators started at the same instant doesn't beat
    /// in phase against the authority.
    pub initial_jitter_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(120),
            debounce: Duration::from_secs(5),
            drift_tolerance: Duration::from_secs(30),
            correct_drift: false,
            initial_jitter_ms: 1_000,
        }
    }
}

impl SyncConfig {
    /// Clamps out-of-range values so the schedule is safe to run.
    ///
    /// Called automatically by `SyncScheduler::new`. Rules:
    /// - a zero `heartbeat_interval` is restored to the default
    /// - `heartbeat_interval` must not be shorter than `debounce`, or
    ///   the spacing guard would starve every heartbeat
    pub fn validated(mut self) -> Self {
        if self.heartbeat_interval.is_zero() {
            warn!("heartbeat_interval must be positive — using default");
            self.heartbeat_interval = Duration::from_secs(120);
        }
        if self.heartbeat_interval < self.debounce {
            warn!(
                heartbeat_secs = self.heartbeat_interval.as_secs(),
                debounce_secs = self.debounce.as_secs(),
                "heartbeat_interval shorter than debounce — clamping"
            );
            self.heartbeat_interval = self.debounce;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SyncConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(120));
        assert_eq!(config.debounce, Duration::from_secs(5));
        assert_eq!(config.drift_tolerance, Duration::from_secs(30));
        assert!(!config.correct_drift);
    }

    #[test]
    fn test_validated_restores_zero_heartbeat() {
        let config = SyncConfig {
            heartbeat_interval: Duration::ZERO,
            ..Default::default()
        }
        .validated();

        assert_eq!(config.heartbeat_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_validated_clamps_heartbeat_below_debounce() {
        let config = SyncConfig {
            heartbeat_interval: Duration::from_secs(2),
            debounce: Duration::from_secs(5),
            ..Default::default()
        }
        .validated();

        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    }
}
