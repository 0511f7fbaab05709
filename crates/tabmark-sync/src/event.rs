use std::fmt;

use tabmark_core::StorageError;

use crate::state::SyncState;

/// Error taxonomy for user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Expired, invalid or denied credential.
    Auth,
    /// Remote unreachable or misbehaving.
    Network,
    /// Malformed stored or remote JSON.
    Parse,
    /// Local storage rejected a write.
    Write,
}

impl FailureKind {
    pub fn classify(err: &StorageError) -> Self {
        match err {
            StorageError::Unauthenticated | StorageError::Auth(_) => FailureKind::Auth,
            StorageError::Network(_) | StorageError::Remote(_) => FailureKind::Network,
            StorageError::Parse(_) | StorageError::Serialization(_) => FailureKind::Parse,
            StorageError::Io(_) | StorageError::QuotaExceeded { .. } => FailureKind::Write,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Auth => write!(f, "auth"),
            FailureKind::Network => write!(f, "network"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Write => write!(f, "write"),
        }
    }
}

/// Transient notification emitted by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    StateChanged(SyncState),
    /// A non-empty remote document replaced the local one.
    RemoteAdopted { tabs: usize },
    /// The local document was pushed into an empty remote.
    LocalPromoted { tabs: usize },
    /// Reconciliation failed; the session fell back to local only.
    Degraded { kind: FailureKind, message: String },
    Pushed { seq: u64 },
    PushFailed {
        seq: u64,
        kind: FailureKind,
        message: String,
    },
    /// Local storage rejected a write. Needs the user's attention.
    WriteFailed { message: String },
    SignedIn,
    SignInFailed,
    SignedOut,
}

impl SyncEvent {
    /// One-line text for a toast or status bar.
    pub fn message(&self) -> String {
        match self {
            SyncEvent::StateChanged(state) => format!("Sync state: {}", state),
            SyncEvent::RemoteAdopted { .. } => "Bookmarks synced from Google Drive!".to_string(),
            SyncEvent::LocalPromoted { .. } | SyncEvent::Pushed { .. } => {
                "Bookmarks synced with Google Drive!".to_string()
            }
            SyncEvent::Degraded { .. } => {
                "Could not sync with Google Drive, using local bookmarks".to_string()
            }
            SyncEvent::PushFailed { .. } => {
                "Failed to sync bookmarks with Google Drive".to_string()
            }
            SyncEvent::WriteFailed { message } => {
                format!("Bookmarks could not be saved on this device: {}", message)
            }
            SyncEvent::SignedIn => "Signed in to Google Drive successfully!".to_string(),
            SyncEvent::SignInFailed => "Failed to sign in to Google Drive".to_string(),
            SyncEvent::SignedOut => "Signed out of Google Drive".to_string(),
        }
    }

    /// True for notifications that report a problem.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncEvent::Degraded { .. }
                | SyncEvent::PushFailed { .. }
                | SyncEvent::WriteFailed { .. }
                | SyncEvent::SignInFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            FailureKind::classify(&StorageError::Unauthenticated),
            FailureKind::Auth
        );
        assert_eq!(
            FailureKind::classify(&StorageError::Network("down".into())),
            FailureKind::Network
        );
        assert_eq!(
            FailureKind::classify(&StorageError::Parse("bad".into())),
            FailureKind::Parse
        );
        assert_eq!(
            FailureKind::classify(&StorageError::QuotaExceeded { needed: 2, quota: 1 }),
            FailureKind::Write
        );
    }

    #[test]
    fn test_failure_events() {
        assert!(SyncEvent::SignInFailed.is_failure());
        assert!(!SyncEvent::Pushed { seq: 1 }.is_failure());
        assert!(SyncEvent::WriteFailed {
            message: "quota".into()
        }
        .message()
        .contains("quota"));
    }
}
