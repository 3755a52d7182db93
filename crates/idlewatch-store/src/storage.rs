//! Persistence capability for the session record.
//!
//! The host environment decides where the record lives — a file on a
//! kiosk, localStorage behind an FFI shim, a test slot in memory. The
//! store only needs three operations, so that's the whole trait.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{SessionRecord, StorageError};

/// Well-known key the record is persisted under. File-backed storage
/// uses it as the file name.
pub const STORAGE_KEY: &str = "idlewatch.session.json";

/// Storage for the single serialized session record.
///
/// Implementations must round-trip a record exactly: `save` then `load`
/// yields an equal record. `load` returns `Ok(None)` when nothing has
/// been saved; corruption is an `Err`, which the store downgrades to
/// "no prior session".
pub trait SessionStorage: Send + 'static {
    /// Reads the persisted record, if any.
    fn load(&self) -> Result<Option<SessionRecord>, StorageError>;

    /// Writes the record, replacing any previous one.
    fn save(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Removes the persisted record. Removing an absent record is not
    /// an error.
    fn clear(&self) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory storage backed by a shared slot.
///
/// The record is held as its serialized JSON text, so it passes through
/// the same serde path as file storage — a record that wouldn't survive
/// a real reload doesn't survive here either. Clones share the slot,
/// which is how tests model "reload the page": build a second store
/// over a clone of the same `MemoryStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the raw stored text. Tests use this to plant corrupt
    /// blobs.
    pub fn set_raw(&self, raw: Option<String>) {
        *self.slot() = raw;
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        // A poisoned lock means a writer panicked mid-assignment of the
        // String, which still leaves a complete previous value.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionRecord>, StorageError> {
        match self.slot().as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let text = serde_json::to_string(record)?;
        *self.slot() = Some(text);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStorage
// ---------------------------------------------------------------------------

/// File-backed storage: one JSON object at a fixed path.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage under `dir`, using [`STORAGE_KEY`] as the file name.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(STORAGE_KEY),
        }
    }

    /// Storage at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the record is persisted to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<SessionRecord>, StorageError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let text = serde_json::to_string(record)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
