//! Lifecycle callbacks consumed by the hosting UI.

/// Outbound lifecycle signals, registered by the UI collaborator.
///
/// The coordinator only *emits* these. Acting on them — the sign-out
/// call, the warning dialog, a live countdown — is the collaborator's
/// job; this subsystem never performs the network sign-out itself.
///
/// Callbacks run on the coordinator task, so they should hand off
/// anything slow rather than block it.
pub trait SessionEvents: Send + Sync + 'static {
    /// The warning lead has been reached. `minutes_remaining` is the
    /// configured lead time, not a live countdown.
    fn on_warning(&self, minutes_remaining: u32);

    /// The idle timeout elapsed. The record is already inactive and
    /// persisted by the time this fires. Fires exactly once per idle
    /// period.
    fn on_expired(&self);

    /// Recorded activity extended the session. Default: ignored.
    fn on_renewed(&self) {}
}
