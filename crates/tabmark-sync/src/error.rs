use tabmark_core::StorageError;
use thiserror::Error;

/// Errors surfaced by the coordinator entry points.
///
/// Remote failures are absorbed into events; only a failed local write makes
/// it out, since local storage is the durability guarantee.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Failed to save bookmarks locally: {0}")]
    Write(StorageError),
}
