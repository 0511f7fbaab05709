use async_trait::async_trait;

use crate::document::BookmarkDocument;
use crate::error::StorageError;

/// Name of the remote document inside the application's private folder.
pub const REMOTE_DOCUMENT_NAME: &str = "bookmarks.json";

/// Remote (cloud) document store, reachable only while authenticated.
///
/// Failures come back as `StorageError` values; callers decide how to absorb them.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the backend identifier (e.g., "google-drive").
    fn backend_name(&self) -> &'static str;

    /// Load a named document. `Ok(None)` when it does not exist yet.
    ///
    /// The legacy bare-array shape is upgraded before it is returned.
    async fn load(&self, key: &str) -> Result<Option<BookmarkDocument>, StorageError>;

    /// Overwrite a named document with the full `doc`.
    async fn save(&self, key: &str, doc: &BookmarkDocument) -> Result<(), StorageError>;
}

/// Bearer-credential lifecycle for the remote store.
///
/// Every method fails closed: errors are logged by the implementation and
/// reported as `false`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Silent re-authentication from the cached credential, validated against
    /// the remote service before it is trusted.
    async fn authenticate(&self) -> bool;

    /// Interactive sign-in. Always prompts.
    async fn sign_in(&self) -> bool;

    /// Revoke and forget the cached credential.
    async fn sign_out(&self);

    fn is_authenticated(&self) -> bool;
}
