//! Session timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing policy for an authenticated session.
///
/// Supplied by the policy collaborator (typically fetched from a backend
/// settings endpoint) at login, and replaceable later through
/// [`SessionConfigUpdate`] when an admin changes the timeout policy.
/// An update atomically replaces the scheduling basis — timers are
/// re-derived from it, never stacked on top of the previous config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Total idle budget: minutes of inactivity after which the session
    /// is considered expired. Must be positive.
    pub idle_timeout_minutes: u32,

    /// How long before expiry the warning fires, in minutes. A value of
    /// zero, or one at or above the idle timeout, disables the warning
    /// (the period becomes expiry-only).
    pub warning_lead_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 15,
            warning_lead_minutes: 2,
        }
    }
}

impl SessionConfig {
    /// Smallest idle timeout a config is clamped to.
    pub const MIN_IDLE_TIMEOUT_MINUTES: u32 = 1;

    /// Creates a config with the given idle timeout and warning lead.
    pub fn new(idle_timeout_minutes: u32, warning_lead_minutes: u32) -> Self {
        Self {
            idle_timeout_minutes,
            warning_lead_minutes,
        }
        .validated()
    }

    /// Clamps out-of-range values so the config is safe to schedule from.
    ///
    /// Rules:
    /// - `idle_timeout_minutes` must be positive; zero is raised to
    ///   [`Self::MIN_IDLE_TIMEOUT_MINUTES`].
    /// - `warning_lead_minutes` is left as supplied — a lead at or above
    ///   the timeout is a valid "no warning" configuration, handled by
    ///   [`Self::warning_delay`].
    pub fn validated(mut self) -> Self {
        if self.idle_timeout_minutes == 0 {
            tracing::warn!(
                min = Self::MIN_IDLE_TIMEOUT_MINUTES,
                "idle_timeout_minutes must be positive — clamping"
            );
            self.idle_timeout_minutes = Self::MIN_IDLE_TIMEOUT_MINUTES;
        }
        self
    }

    /// Total idle budget as a duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.idle_timeout_minutes) * 60)
    }

    /// Warning lead as a duration.
    pub fn warning_lead(&self) -> Duration {
        Duration::from_secs(u64::from(self.warning_lead_minutes) * 60)
    }

    /// Delay from last activity to the warning, or `None` when no
    /// warning should be armed.
    ///
    /// The warning arms only when its delay is positive and strictly
    /// shorter than the expiry delay, i.e. `0 < lead < timeout`.
    pub fn warning_delay(&self) -> Option<Duration> {
        if self.warning_lead_minutes == 0
            || self.warning_lead_minutes >= self.idle_timeout_minutes
        {
            return None;
        }
        Some(self.idle_timeout() - self.warning_lead())
    }
}

// ---------------------------------------------------------------------------
// SessionConfigUpdate
// ---------------------------------------------------------------------------

/// Partial config change from the policy collaborator.
///
/// Fields left `None` keep their current value. Applying an update never
/// touches the activity clock — only the scheduling basis changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfigUpdate {
    pub idle_timeout_minutes: Option<u32>,
    pub warning_lead_minutes: Option<u32>,
}

impl SessionConfigUpdate {
    /// Merges this update into `current`, clamping the result.
    pub fn apply_to(self, current: SessionConfig) -> SessionConfig {
        SessionConfig {
            idle_timeout_minutes: self
                .idle_timeout_minutes
                .unwrap_or(current.idle_timeout_minutes),
            warning_lead_minutes: self
                .warning_lead_minutes
                .unwrap_or(current.warning_lead_minutes),
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fifteen_two() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout_minutes, 15);
        assert_eq!(config.warning_lead_minutes, 2);
    }

    #[test]
    fn test_validated_clamps_zero_timeout() {
        let config = SessionConfig::new(0, 0);
        assert_eq!(
            config.idle_timeout_minutes,
            SessionConfig::MIN_IDLE_TIMEOUT_MINUTES
        );
    }

    #[test]
    fn test_warning_delay_normal_lead() {
        let config = SessionConfig::new(15, 2);
        assert_eq!(config.warning_delay(), Some(Duration::from_secs(13 * 60)));
    }

    #[test]
    fn test_warning_delay_zero_lead_is_none() {
        let config = SessionConfig::new(15, 0);
        assert_eq!(config.warning_delay(), None);
    }

    #[test]
    fn test_warning_delay_lead_at_timeout_is_none() {
        let config = SessionConfig::new(15, 15);
        assert_eq!(config.warning_delay(), None);
    }

    #[test]
    fn test_warning_delay_lead_above_timeout_is_none() {
        let config = SessionConfig::new(15, 20);
        assert_eq!(config.warning_delay(), None);
    }

    #[test]
    fn test_update_merges_only_set_fields() {
        let current = SessionConfig::new(15, 2);
        let update = SessionConfigUpdate {
            idle_timeout_minutes: Some(30),
            warning_lead_minutes: None,
        };

        let merged = update.apply_to(current);

        assert_eq!(merged.idle_timeout_minutes, 30);
        assert_eq!(merged.warning_lead_minutes, 2);
    }

    #[test]
    fn test_update_empty_is_identity() {
        let current = SessionConfig::new(15, 2);
        let merged = SessionConfigUpdate::default().apply_to(current);
        assert_eq!(merged, current);
    }

    #[test]
    fn test_update_result_is_clamped() {
        let current = SessionConfig::new(15, 2);
        let update = SessionConfigUpdate {
            idle_timeout_minutes: Some(0),
            warning_lead_minutes: None,
        };

        let merged = update.apply_to(current);

        assert_eq!(
            merged.idle_timeout_minutes,
            SessionConfig::MIN_IDLE_TIMEOUT_MINUTES
        );
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = SessionConfig::new(45, 5);
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
