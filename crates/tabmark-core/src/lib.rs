//! Core traits and types for tabmark storage backends.
//!
//! This crate defines the abstractions shared between the local store, the
//! remote (cloud) store and the sync coordinator:
//! - `BookmarkDocument`: the replaced-whole document and its editing helpers
//! - `PersistenceStore` / `CredentialStore`: synchronous local slots
//! - `RemoteStore` / `AuthProvider`: the cloud side, reachable only while signed in

mod document;
mod error;
mod id;
mod storage;
mod sync;

pub use document::{
    normalize_url, Bookmark, BookmarkDocument, BookmarkTab, DocumentError, DocumentShape,
    DEFAULT_TAB_ID, DEFAULT_TAB_NAME,
};
pub use error::StorageError;
pub use id::IdGenerator;
pub use storage::{
    CredentialStore, PersistenceStore, StoredCredential, CREDENTIAL_KEY, DOCUMENT_KEY,
};
pub use sync::{AuthProvider, RemoteStore, REMOTE_DOCUMENT_NAME};
