//! Error types for the reconciliation layer.

/// A heartbeat that could not produce a usable answer.
///
/// Every variant is advisory: the reconciler logs it and abandons the
/// sync, and local timers continue unaffected. The remote check is
/// never a single point of failure for session expiry.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The authority could not be reached or the request failed in
    /// transit.
    #[error("authority unreachable: {0}")]
    Network(String),

    /// The authority answered with a body that did not decode.
    #[error("malformed authority response: {0}")]
    Decode(String),
}

/// Why a requested sync was dropped before it started.
///
/// Not an error — dropped syncs are the designed behavior of the
/// single-flight gate, logged at debug and never queued or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyncSkip {
    /// A sync is already in flight; the request is dropped, not queued.
    #[error("a sync is already in flight")]
    InFlight,

    /// The previous attempt was closer than the minimum spacing.
    #[error("last sync attempt was too recent")]
    TooSoon,
}
