//! Reconciliation between the local bookmark store and the remote store.
//!
//! `SyncCoordinator` is the single owner of the merge policy:
//! - on start it presents the local document, then reconciles with the remote
//!   one if the user is signed in (non-empty remote wins, otherwise local is
//!   promoted)
//! - every edit is written locally first, then pushed through a coalescing
//!   background worker while signed in
//! - remote failures never escape; they become `SyncEvent`s

mod coordinator;
mod error;
mod event;
mod push;
mod state;

#[cfg(test)]
mod testing;

pub use coordinator::SyncCoordinator;
pub use error::SyncError;
pub use event::{FailureKind, SyncEvent};
pub use state::SyncState;
