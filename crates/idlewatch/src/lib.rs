//! # Idlewatch
//!
//! Client-side session lifecycle coordination: decides when an
//! authenticated session is idle-expired, warns before expiry, extends
//! on activity, and cross-checks its view against a remote session
//! authority.
//!
//! The coordinator runs as a single Tokio task behind a cheap-clone
//! [`CoordinatorHandle`]; it emits lifecycle signals through the
//! [`SessionEvents`] trait and leaves acting on them (sign-out, dialogs)
//! to the hosting application.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use idlewatch::prelude::*;
//!
//! // Implement SessionAuthority + SessionEvents for your app, then:
//! // let handle = spawn_coordinator(
//! //     JsonFileStorage::new("/var/lib/myapp"),
//! //     my_authority,
//! //     my_events,
//! // );
//! // handle.begin(SessionConfig::new(15, 2)).await?;
//! ```

mod coordinator;
mod error;
mod events;

pub use coordinator::{spawn_coordinator, CoordinatorBuilder, CoordinatorHandle};
pub use error::{CoordinatorError, IdlewatchError};
pub use events::SessionEvents;

/// Everything an application shell typically needs.
pub mod prelude {
    pub use crate::{
        spawn_coordinator, CoordinatorBuilder, CoordinatorHandle,
        IdlewatchError, SessionEvents,
    };
    pub use idlewatch_activity::{
        ActivityKind, ActivityObserver, InteractionHost, ACTIVITY_SIGNALS,
    };
    pub use idlewatch_store::{
        Clock, JsonFileStorage, MemoryStorage, SessionConfig,
        SessionConfigUpdate, SessionStorage,
    };
    pub use idlewatch_sync::{
        AuthorityResponse, RemoteSessionView, SessionAuthority, SyncConfig,
        SyncError,
    };
}
