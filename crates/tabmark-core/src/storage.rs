use serde::{Deserialize, Serialize};

use crate::document::BookmarkDocument;
use crate::error::StorageError;

/// Well-known local key holding the bookmark document.
pub const DOCUMENT_KEY: &str = "bookmarkData";
/// Well-known local key holding the cached bearer credential.
pub const CREDENTIAL_KEY: &str = "google_drive_token";

/// A cached bearer credential, stored apart from the bookmark document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    #[serde(rename = "expiresAtEpochMs")]
    pub expires_at_epoch_ms: i64,
}

impl StoredCredential {
    /// Build a credential from a grant that lives `expires_in_secs` from `now_ms`.
    pub fn from_grant(token: impl Into<String>, expires_in_secs: u64, now_ms: i64) -> Self {
        let lifetime_ms = i64::try_from(expires_in_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        Self {
            token: token.into(),
            expires_at_epoch_ms: now_ms.saturating_add(lifetime_ms),
        }
    }

    /// True when the credential stays valid for more than `buffer_ms` after `now_ms`.
    pub fn is_valid_for(&self, now_ms: i64, buffer_ms: i64) -> bool {
        self.expires_at_epoch_ms > now_ms.saturating_add(buffer_ms)
    }
}

/// Durable local storage of the bookmark document.
///
/// Synchronous: the local write happens before anything else on every edit
/// and never suspends.
pub trait PersistenceStore: Send + Sync {
    /// Returns the backend identifier (e.g., "file", "memory").
    fn backend_name(&self) -> &'static str;

    /// Load the last saved document.
    ///
    /// Missing or unparseable data yields an empty document; the legacy
    /// bare-array shape is upgraded.
    fn load(&self) -> BookmarkDocument;

    /// Overwrite the stored document.
    fn save(&self, doc: &BookmarkDocument) -> Result<(), StorageError>;
}

/// Local slot for the cached credential.
pub trait CredentialStore: Send + Sync {
    /// Load the cached credential, if any. Unparseable records read as `None`.
    fn load_credential(&self) -> Option<StoredCredential>;

    fn save_credential(&self, credential: &StoredCredential) -> Result<(), StorageError>;

    /// Remove the cached credential. Clearing an empty slot is not an error.
    fn clear_credential(&self) -> Result<(), StorageError>;
}
