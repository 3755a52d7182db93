//! Remote session reconciliation for Idlewatch.
//!
//! Local timers are authoritative; the remote session authority is a
//! periodic cross-check. This crate carries the pieces of that check:
//!
//! 1. **The boundary** — the [`SessionAuthority`] trait and its wire
//!    types ([`AuthorityResponse`], [`RemoteSessionView`])
//! 2. **The schedule** — [`SyncScheduler`]: heartbeat + activity
//!    debounce, funneled through a single-flight gate
//! 3. **The comparison** — [`expiry_drift`] and the (disabled by
//!    default) correction policy
//!
//! Every failure path here degrades to "rely on local timers only".

mod authority;
mod config;
mod drift;
mod error;
mod scheduler;

pub use authority::{AuthorityResponse, RemoteSessionView, SessionAuthority};
pub use config::SyncConfig;
pub use drift::{corrected_last_activity_ms, expiry_drift, DriftDirection, DriftReport};
pub use error::{SyncError, SyncSkip};
pub use scheduler::{SyncScheduler, SyncTrigger};
