//! Error types for the store layer.

/// Errors from the persistence backend.
///
/// These never cross the store boundary on the read path — an unreadable
/// record is treated as "no prior session" — but storage implementations
/// report them so the store can log what was discarded.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    /// The stored blob did not deserialize into a session record.
    #[error("malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),
}
