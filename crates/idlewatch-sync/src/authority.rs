//! The remote session authority: the network boundary of the reconciler.
//!
//! Idlewatch doesn't implement the heartbeat transport itself — that's
//! the host application's job (HTTP client, RPC stub, whatever the
//! backend speaks). The [`SessionAuthority`] trait is a single async
//! method the reconciler calls; production wires it to the backend's
//! session endpoint, development and tests use canned stubs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SyncError;

/// The authority's view of the session — a transient snapshot, used
/// only as a cross-check against locally derived expiry, never as the
/// source of truth for local scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSessionView {
    /// When the authority believes the session expires.
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Response body of the parameterless heartbeat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityResponse {
    /// Whether the authority considers the session valid.
    pub success: bool,

    /// Present on success when the authority reports an expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<RemoteSessionView>,

    /// Optional human-readable detail, mostly on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Asks the remote session authority for its view of session validity.
///
/// # Trait bounds
///
/// - `Send + Sync` — the reconciler calls it from a spawned task.
/// - `'static` — it lives as long as the coordinator.
///
/// # Example
///
/// ```rust
/// use idlewatch_sync::{AuthorityResponse, SessionAuthority, SyncError};
///
/// /// Always reports an invalid session. Useful in tests.
/// struct DeniedAuthority;
///
/// impl SessionAuthority for DeniedAuthority {
///     async fn check_session(&self) -> Result<AuthorityResponse, SyncError> {
///         Ok(AuthorityResponse {
///             success: false,
///             session: None,
///             message: Some("no active session".into()),
///         })
///     }
/// }
/// ```
pub trait SessionAuthority: Send + Sync + 'static {
    /// Performs one heartbeat call.
    ///
    /// # Returns
    /// - `Ok(response)` — the authority answered; `response.success`
    ///   and `response.session` carry its view
    /// - `Err(SyncError)` — transport or decode failure; the caller
    ///   logs and abandons the sync, local timers stay authoritative
    fn check_session(
        &self,
    ) -> impl std::future::Future<Output = Result<AuthorityResponse, SyncError>> + Send;
}
