//! Deferred synchronization.
//!
//! Saves either hit the API immediately or are serialized into a
//! [`SyncManager`] queue and replayed later under its credentials.

pub mod manager;
pub mod pending;
pub mod synchronizable;


pub use manager::{HoldReason, ReplayOutcome, ReplayPolicy, ReplayReport, SyncManager};
pub use pending::PendingAction;
pub use synchronizable::{
    CascadeOrder, DeferredSaveOptions, EntityKind, SaveOptions, SaveOutcome, Synchronizable,
};
