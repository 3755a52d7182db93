//! Unified error type for Idlewatch.

use idlewatch_store::StorageError;
use idlewatch_sync::SyncError;

/// Top-level error wrapping each layer's error type.
///
/// Application code holding a `CoordinatorHandle` only ever needs this
/// one type; the `#[from]` conversions let `?` lift sub-crate errors
/// into it without explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum IdlewatchError {
    /// A persistence-level error (read, write, deserialize).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A reconciliation-level error (network, decode).
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A coordinator-level error (handle can no longer reach the task).
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// Errors from the coordinator handle.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The coordinator task is gone — shut down, or its runtime
    /// dropped. Every handle operation fails this way afterwards.
    #[error("coordinator is no longer running")]
    ChannelClosed,
}
