//! Local/remote expiry comparison.
//!
//! The authority's view is advisory. The comparison always runs and is
//! always reported; the corrective adjustment is computed here but only
//! applied by the coordinator when the `correct_drift` policy is
//! enabled — and it ships disabled.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Which clock believes the session lives longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftDirection {
    /// Remote expiry is later than local — the server grants more time.
    RemoteAhead,

    /// Remote expiry is earlier than local — the server would cut the
    /// session off sooner than local timers will.
    RemoteBehind,
}

/// Outcome of comparing locally derived expiry with the authority's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftReport {
    /// Absolute divergence between the two expiry instants.
    pub drift: Duration,

    /// Which side is ahead. Meaningless when `drift` is zero (reported
    /// as `RemoteAhead` by convention).
    pub direction: DriftDirection,

    /// Whether `drift` exceeds the configured tolerance.
    pub exceeds_tolerance: bool,
}

/// Compares the local expiry instant with the authority's.
pub fn expiry_drift(
    local_expires_at_ms: u64,
    remote_expires_at: DateTime<Utc>,
    tolerance: Duration,
) -> DriftReport {
    let remote_ms = remote_expires_at.timestamp_millis().max(0) as u64;

    let (drift_ms, direction) = if remote_ms >= local_expires_at_ms {
        (remote_ms - local_expires_at_ms, DriftDirection::RemoteAhead)
    } else {
        (local_expires_at_ms - remote_ms, DriftDirection::RemoteBehind)
    };

    let drift = Duration::from_millis(drift_ms);
    DriftReport {
        drift,
        direction,
        exceeds_tolerance: drift > tolerance,
    }
}

/// The `last_activity_ms` value that would make local expiry coincide
/// with the remote view under the given idle timeout.
///
/// This is the corrective half of reconciliation. Callers apply it only
/// under `SyncConfig::correct_drift`, which defaults to off.
pub fn corrected_last_activity_ms(
    remote_expires_at: DateTime<Utc>,
    idle_timeout: Duration,
) -> u64 {
    let remote_ms = remote_expires_at.timestamp_millis().max(0) as u64;
    remote_ms.saturating_sub(idle_timeout.as_millis() as u64)
}
