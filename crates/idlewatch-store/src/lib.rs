//! Session record, timing configuration, and persistence for Idlewatch.
//!
//! This crate is the leaf of the stack: the canonical, persisted answer
//! to "when did activity last occur, and under what timing policy?".
//!
//! 1. **Record & config** — [`SessionRecord`], [`SessionConfig`], and
//!    partial updates ([`SessionConfigUpdate`])
//! 2. **Persistence** — the [`SessionStorage`] capability with in-memory
//!    and file-backed implementations
//! 3. **The store** — [`SessionStore`], the exclusive owner of the
//!    record; every mutation persists immediately
//! 4. **Clock** — [`Clock`], epoch milliseconds advanced by Tokio time
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← supplies `now_ms`, reacts to outcomes
//!     ↕
//! Store layer (this crate)  ← owns the persisted record
//!     ↕
//! SessionStorage (below)  ← file, memory, or host-provided backend
//! ```

mod clock;
mod config;
mod error;
mod record;
mod storage;
mod store;

pub use clock::Clock;
pub use config::{SessionConfig, SessionConfigUpdate};
pub use error::StorageError;
pub use record::SessionRecord;
pub use storage::{JsonFileStorage, MemoryStorage, SessionStorage, STORAGE_KEY};
pub use store::{ActivityOutcome, SessionStore, ACTIVITY_THROTTLE_MS};
