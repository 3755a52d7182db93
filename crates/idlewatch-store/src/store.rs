//! The session store: canonical owner of the session record.
//!
//! Every mutation of the record goes through this type, and every
//! mutation is persisted immediately so a reload picks up where the
//! process left off. The store knows nothing about timers or the
//! network — it reports *what changed* (see [`ActivityOutcome`]) and the
//! coordinator re-arms schedules accordingly.
//!
//! All time-dependent operations take `now_ms` explicitly. The caller
//! owns the clock; the store stays a pure function of its inputs, which
//! is what keeps the unit tests free of sleeps.

use std::time::Duration;

use crate::{
    SessionConfig, SessionConfigUpdate, SessionRecord, SessionStorage,
};

/// Minimum spacing between recorded activity bumps, in milliseconds.
///
/// Interaction events arrive in bursts (every pointer move, every key).
/// Re-arming two timers and persisting the record for each one would be
/// pure churn, so bumps closer than this floor to the previous one are
/// dropped.
pub const ACTIVITY_THROTTLE_MS: u64 = 30_000;

/// What a call to [`SessionStore::record_activity`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// `last_activity_ms` was bumped and persisted. The caller must
    /// re-arm the timers and note a debounced sync.
    Recorded,

    /// The bump fell inside the throttle floor; nothing changed.
    Throttled,

    /// No session, or the session is no longer active; nothing changed.
    NoSession,
}

/// Owns the [`SessionRecord`] and its persistence.
pub struct SessionStore<S: SessionStorage> {
    storage: S,
    record: Option<SessionRecord>,
}

impl<S: SessionStorage> SessionStore<S> {
    /// Creates a store, restoring any previously persisted record.
    ///
    /// A record that cannot be read or deserialized is treated as "no
    /// prior session": the blob is discarded and the failure is logged,
    /// never surfaced.
    pub fn restore(storage: S) -> Self {
        let record = match storage.load() {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable session record");
                let _ = storage.clear();
                None
            }
        };

        if let Some(record) = &record {
            tracing::info!(
                last_activity_ms = record.last_activity_ms,
                active = record.is_active,
                "restored persisted session record"
            );
        }

        Self { storage, record }
    }

    /// Starts a new session: fresh record at `now_ms`, persisted.
    ///
    /// Replaces any existing record, active or not.
    pub fn begin(&mut self, config: SessionConfig, now_ms: u64) {
        let config = config.validated();
        self.record = Some(SessionRecord::new(config, now_ms));
        self.persist();
        tracing::info!(
            idle_timeout_minutes = config.idle_timeout_minutes,
            warning_lead_minutes = config.warning_lead_minutes,
            "session started"
        );
    }

    /// Records an interaction at `now_ms`.
    ///
    /// No-op without an active session, and throttled to at most one
    /// bump per [`ACTIVITY_THROTTLE_MS`]. Bumps are last-write-wins:
    /// only "more recent" activity matters.
    pub fn record_activity(&mut self, now_ms: u64) -> ActivityOutcome {
        let Some(record) = &mut self.record else {
            return ActivityOutcome::NoSession;
        };
        if !record.is_active {
            return ActivityOutcome::NoSession;
        }
        if record.elapsed_ms(now_ms) < ACTIVITY_THROTTLE_MS {
            return ActivityOutcome::Throttled;
        }

        record.last_activity_ms = now_ms;
        self.persist();
        tracing::trace!(last_activity_ms = now_ms, "activity recorded");
        ActivityOutcome::Recorded
    }

    /// Merges a config update into the current record and persists.
    ///
    /// `last_activity_ms` is deliberately untouched — the new policy
    /// applies to the idle time already accumulated. Returns `false`
    /// when there is no record to update.
    pub fn update_config(&mut self, update: SessionConfigUpdate) -> bool {
        let Some(record) = &mut self.record else {
            return false;
        };

        record.config = update.apply_to(record.config);
        let config = record.config;
        self.persist();
        tracing::info!(
            idle_timeout_minutes = config.idle_timeout_minutes,
            warning_lead_minutes = config.warning_lead_minutes,
            "session config updated"
        );
        true
    }

    /// Whether the session is active at `now_ms`.
    ///
    /// Self-correcting: if the idle budget is already spent, the record
    /// transitions to expired (and is persisted) before `false` is
    /// returned, so a lost timer — a suspended process, a missed wakeup
    /// — cannot leave a stale "active" answer. Callers that observe the
    /// `true → false` edge here are responsible for the expiry
    /// notification.
    pub fn is_active(&mut self, now_ms: u64) -> bool {
        let Some(record) = &mut self.record else {
            return false;
        };
        if !record.is_active {
            return false;
        }
        if record.is_expired(now_ms) {
            record.is_active = false;
            self.persist();
            tracing::info!("session expired on inspection");
            return false;
        }
        true
    }

    /// Transitions an active session to expired and persists.
    ///
    /// Returns `true` only when a live session was expired by this call,
    /// so the expiry notification fires exactly once per idle period.
    pub fn mark_expired(&mut self) -> bool {
        let Some(record) = &mut self.record else {
            return false;
        };
        if !record.is_active {
            return false;
        }

        record.is_active = false;
        self.persist();
        true
    }

    /// Idle budget left at `now_ms`; `None` without an active session.
    pub fn time_remaining(&self, now_ms: u64) -> Option<Duration> {
        let record = self.active_record()?;
        Some(Duration::from_millis(record.remaining_ms(now_ms)))
    }

    /// Remaining budget in whole seconds (floor), for UI consumption.
    pub fn remaining_seconds(&self, now_ms: u64) -> Option<u64> {
        Some(self.active_record()?.remaining_ms(now_ms) / 1_000)
    }

    /// Remaining budget in minutes (ceiling), for UI consumption: a
    /// session shows "2 minutes" until it actually drops below one.
    pub fn remaining_minutes(&self, now_ms: u64) -> Option<u64> {
        Some(self.active_record()?.remaining_ms(now_ms).div_ceil(60_000))
    }

    /// Rewrites `last_activity_ms` directly, bypassing the throttle.
    ///
    /// This is the drift-correction hook: only the reconciler's
    /// correction policy calls it, and that policy ships disabled.
    pub fn align_last_activity(&mut self, last_activity_ms: u64) -> bool {
        let Some(record) = &mut self.record else {
            return false;
        };
        if !record.is_active {
            return false;
        }

        record.last_activity_ms = last_activity_ms;
        self.persist();
        tracing::info!(last_activity_ms, "activity clock aligned to remote view");
        true
    }

    /// Ends the session: record dropped, persisted state cleared.
    /// Idempotent.
    pub fn end(&mut self) {
        if self.record.take().is_some() {
            tracing::info!("session ended");
        }
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to clear persisted session record");
        }
    }

    /// Read access to the current record, active or not.
    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    fn active_record(&self) -> Option<&SessionRecord> {
        self.record.as_ref().filter(|r| r.is_active)
    }

    /// Persists the current record. Save failures are logged and
    /// swallowed — local operation continues on the in-memory record.
    fn persist(&self) {
        let Some(record) = &self.record else {
            return;
        };
        if let Err(e) = self.storage.save(record) {
            tracing::warn!(error = %e, "failed to persist session record");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionStore`.
    //!
    //! Time never passes here — every operation takes `now_ms`, so the
    //! tests just pick the timestamps they need. `MemoryStorage` clones
    //! share their slot, which is how the reload tests model a restart.

    use crate::MemoryStorage;

    use super::*;

    const MIN: u64 = 60_000;

    fn store_with(config: SessionConfig) -> SessionStore<MemoryStorage> {
        let mut store = SessionStore::restore(MemoryStorage::new());
        store.begin(config, 0);
        store
    }

    fn default_store() -> SessionStore<MemoryStorage> {
        store_with(SessionConfig::new(15, 2))
    }

    // =====================================================================
    // begin()
    // =====================================================================

    #[test]
    fn test_begin_creates_active_record_at_now() {
        let store = default_store();

        let record = store.record().expect("record should exist");
        assert!(record.is_active);
        assert_eq!(record.last_activity_ms, 0);
    }

    #[test]
    fn test_begin_replaces_expired_record() {
        let mut store = default_store();
        assert!(!store.is_active(15 * MIN)); // expire it

        store.begin(SessionConfig::new(15, 2), 20 * MIN);

        assert!(store.is_active(20 * MIN));
        assert_eq!(store.record().unwrap().last_activity_ms, 20 * MIN);
    }

    // =====================================================================
    // record_activity()
    // =====================================================================

    #[test]
    fn test_record_activity_bumps_after_throttle_floor() {
        let mut store = default_store();

        let outcome = store.record_activity(ACTIVITY_THROTTLE_MS);

        assert_eq!(outcome, ActivityOutcome::Recorded);
        assert_eq!(
            store.record().unwrap().last_activity_ms,
            ACTIVITY_THROTTLE_MS
        );
    }

    #[test]
    fn test_record_activity_within_floor_is_throttled() {
        let mut store = default_store();

        let outcome = store.record_activity(ACTIVITY_THROTTLE_MS - 1);

        assert_eq!(outcome, ActivityOutcome::Throttled);
        assert_eq!(store.record().unwrap().last_activity_ms, 0);
    }

    #[test]
    fn test_record_activity_twice_within_floor_bumps_once() {
        let mut store = default_store();

        assert_eq!(store.record_activity(40_000), ActivityOutcome::Recorded);
        assert_eq!(store.record_activity(50_000), ActivityOutcome::Throttled);

        assert_eq!(store.record().unwrap().last_activity_ms, 40_000);
    }

    #[test]
    fn test_record_activity_without_session_is_ignored() {
        let mut store = SessionStore::restore(MemoryStorage::new());

        assert_eq!(store.record_activity(60_000), ActivityOutcome::NoSession);
    }

    #[test]
    fn test_record_activity_on_expired_session_is_ignored() {
        let mut store = default_store();
        assert!(store.mark_expired());

        assert_eq!(store.record_activity(60_000), ActivityOutcome::NoSession);
    }

    // =====================================================================
    // update_config()
    // =====================================================================

    #[test]
    fn test_update_config_preserves_activity_clock() {
        let mut store = default_store();
        store.record_activity(5 * MIN);

        store.update_config(SessionConfigUpdate {
            idle_timeout_minutes: Some(30),
            warning_lead_minutes: None,
        });

        assert_eq!(store.record().unwrap().last_activity_ms, 5 * MIN);
        // New budget applies to idle time already accumulated.
        assert_eq!(
            store.time_remaining(10 * MIN),
            Some(Duration::from_millis(25 * MIN))
        );
    }

    #[test]
    fn test_update_config_without_session_returns_false() {
        let mut store = SessionStore::restore(MemoryStorage::new());

        assert!(!store.update_config(SessionConfigUpdate::default()));
    }

    // =====================================================================
    // is_active() — the self-correcting predicate
    // =====================================================================

    #[test]
    fn test_is_active_within_budget() {
        let mut store = default_store();
        assert!(store.is_active(15 * MIN - 1));
    }

    #[test]
    fn test_is_active_past_budget_self_corrects() {
        let mut store = default_store();

        assert!(!store.is_active(15 * MIN));

        // The transition was persisted, not just answered.
        let record = store.record().unwrap();
        assert!(!record.is_active);
    }

    #[test]
    fn test_is_active_without_session_is_false() {
        let mut store = SessionStore::restore(MemoryStorage::new());
        assert!(!store.is_active(0));
    }

    // =====================================================================
    // mark_expired()
    // =====================================================================

    #[test]
    fn test_mark_expired_fires_once() {
        let mut store = default_store();

        assert!(store.mark_expired());
        assert!(!store.mark_expired()); // second call reports nothing new
    }

    // =====================================================================
    // time_remaining() and granularities
    // =====================================================================

    #[test]
    fn test_time_remaining_counts_down() {
        let store = default_store();

        assert_eq!(
            store.time_remaining(13 * MIN),
            Some(Duration::from_millis(2 * MIN))
        );
        assert_eq!(store.time_remaining(16 * MIN), Some(Duration::ZERO));
    }

    #[test]
    fn test_time_remaining_without_session_is_none() {
        let store = SessionStore::restore(MemoryStorage::new());
        assert_eq!(store.time_remaining(0), None);
    }

    #[test]
    fn test_remaining_granularities() {
        let store = default_store();

        // 14:30 in: 30 seconds left.
        assert_eq!(store.remaining_seconds(14 * MIN + 30_000), Some(30));
        // Minutes round up: 30s left still reads as 1 minute.
        assert_eq!(store.remaining_minutes(14 * MIN + 30_000), Some(1));
        assert_eq!(store.remaining_minutes(0), Some(15));
    }

    // =====================================================================
    // align_last_activity()
    // =====================================================================

    #[test]
    fn test_align_last_activity_bypasses_throttle() {
        let mut store = default_store();

        assert!(store.align_last_activity(10_000)); // inside the floor

        assert_eq!(store.record().unwrap().last_activity_ms, 10_000);
    }

    // =====================================================================
    // end()
    // =====================================================================

    #[test]
    fn test_end_clears_record_and_storage() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::restore(storage.clone());
        store.begin(SessionConfig::default(), 0);

        store.end();
        store.end(); // idempotent

        assert!(store.record().is_none());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_operations_after_end_are_noops() {
        let mut store = default_store();
        store.end();

        assert_eq!(store.record_activity(60_000), ActivityOutcome::NoSession);
        assert!(!store.update_config(SessionConfigUpdate::default()));
        assert!(!store.is_active(0));
        assert_eq!(store.time_remaining(0), None);
    }

    // =====================================================================
    // restore() — reload behavior
    // =====================================================================

    #[test]
    fn test_restore_round_trips_active_record() {
        let storage = MemoryStorage::new();
        let mut first = SessionStore::restore(storage.clone());
        first.begin(SessionConfig::new(15, 2), 1_000);
        first.record_activity(2 * MIN);

        let second = SessionStore::restore(storage);

        assert_eq!(first.record(), second.record());
    }

    #[test]
    fn test_restore_matches_continuous_instance() {
        let storage = MemoryStorage::new();
        let mut continuous = SessionStore::restore(storage.clone());
        continuous.begin(SessionConfig::new(15, 2), 0);

        let mut reloaded = SessionStore::restore(storage);

        // Same answer at the same wall-clock moment, before and past
        // the deadline.
        assert_eq!(reloaded.is_active(10 * MIN), continuous.is_active(10 * MIN));
        assert_eq!(reloaded.is_active(16 * MIN), continuous.is_active(16 * MIN));
    }

    #[test]
    fn test_restore_corrupt_blob_is_no_session() {
        let storage = MemoryStorage::new();
        storage.set_raw(Some("{\"not\": \"a record\"".into()));

        let store = SessionStore::restore(storage.clone());

        assert!(store.record().is_none());
        // The unreadable blob was discarded, not kept around.
        assert!(storage.load().unwrap().is_none());
    }
}
