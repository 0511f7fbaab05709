use std::path::Path;

use tabmark_core::{
    BookmarkDocument, CredentialStore, PersistenceStore, StorageError, StoredCredential,
    CREDENTIAL_KEY, DOCUMENT_KEY,
};
use tracing::{debug, instrument, warn};

use crate::slots::{FileSlots, MemorySlots, SlotStorage};

/// Default quota across all slots, the usual browser local-storage budget.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Slots managed by this store; their sizes count against the quota.
const MANAGED_SLOTS: [&str; 2] = [DOCUMENT_KEY, CREDENTIAL_KEY];

/// Local store holding the bookmark document and the cached credential.
///
/// Both records live in their own slot under a well-known key. Writes that
/// would push the total size of the managed slots past the quota are rejected
/// with `StorageError::QuotaExceeded`.
#[derive(Debug)]
pub struct LocalStore<S = FileSlots> {
    slots: S,
    quota_bytes: Option<u64>,
}

impl LocalStore<FileSlots> {
    /// Open a file-backed store in `dir` with the default quota.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::new(FileSlots::new(dir)).with_quota(Some(DEFAULT_QUOTA_BYTES))
    }
}

impl LocalStore<MemorySlots> {
    /// Create an in-memory store with no quota.
    pub fn in_memory() -> Self {
        Self::new(MemorySlots::new())
    }
}

impl<S: SlotStorage> LocalStore<S> {
    pub fn new(slots: S) -> Self {
        Self {
            slots,
            quota_bytes: None,
        }
    }

    /// Set or lift the byte quota.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// Check that writing `len` bytes into `key` stays within the quota.
    fn check_quota(&self, key: &str, len: usize) -> Result<(), StorageError> {
        let Some(quota) = self.quota_bytes else {
            return Ok(());
        };

        let mut needed = len as u64;
        for other in MANAGED_SLOTS.iter().filter(|k| **k != key) {
            needed += self.slots.size(other)?;
        }

        if needed > quota {
            return Err(StorageError::QuotaExceeded { needed, quota });
        }
        Ok(())
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_quota(key, value.len())?;
        self.slots.write(key, value)
    }
}

impl<S: SlotStorage> PersistenceStore for LocalStore<S> {
    fn backend_name(&self) -> &'static str {
        self.slots.backend_name()
    }

    #[instrument(skip(self), level = "debug")]
    fn load(&self) -> BookmarkDocument {
        let raw = match self.slots.read(DOCUMENT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored bookmarks, starting empty");
                return BookmarkDocument::default();
            }
            Err(e) => {
                warn!("Failed to read stored bookmarks, starting empty: {}", e);
                return BookmarkDocument::default();
            }
        };

        match BookmarkDocument::decode(&raw) {
            Ok(doc) => {
                debug!("Loaded bookmarks with {} tabs", doc.tabs.len());
                doc
            }
            Err(e) => {
                warn!("Stored bookmarks are unreadable, starting empty: {}", e);
                BookmarkDocument::default()
            }
        }
    }

    #[instrument(skip(self, doc), level = "debug", fields(tabs = doc.tabs.len()))]
    fn save(&self, doc: &BookmarkDocument) -> Result<(), StorageError> {
        let json = doc.encode()?;
        self.write_slot(DOCUMENT_KEY, &json)?;
        debug!("Saved bookmarks with {} tabs", doc.tabs.len());
        Ok(())
    }
}

impl<S: SlotStorage> CredentialStore for LocalStore<S> {
    fn load_credential(&self) -> Option<StoredCredential> {
        let raw = match self.slots.read(CREDENTIAL_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read cached credential: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("Cached credential is unreadable, ignoring it: {}", e);
                None
            }
        }
    }

    fn save_credential(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        let json = serde_json::to_string(credential).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize credential: {}", e))
        })?;
        self.write_slot(CREDENTIAL_KEY, &json)?;
        debug!(
            "Cached credential (expires at {})",
            credential.expires_at_epoch_ms
        );
        Ok(())
    }

    fn clear_credential(&self) -> Result<(), StorageError> {
        self.slots.remove(CREDENTIAL_KEY)
    }
}
