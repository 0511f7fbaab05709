use std::fmt;

/// Where a session stands with respect to the remote store.
///
/// `Uninitialized → LocalLoaded → Authenticating → { Synced | LocalOnly }`.
/// Sign-in re-enters `Authenticating`; sign-out lands in `LocalOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Uninitialized,
    LocalLoaded,
    Authenticating,
    /// Signed in; local and remote agree and edits are pushed.
    Synced,
    /// Local storage is the sole authority.
    LocalOnly,
}

impl SyncState {
    /// True when edits should be pushed to the remote store.
    pub fn is_synced(self) -> bool {
        self == SyncState::Synced
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Uninitialized => write!(f, "uninitialized"),
            SyncState::LocalLoaded => write!(f, "local-loaded"),
            SyncState::Authenticating => write!(f, "authenticating"),
            SyncState::Synced => write!(f, "synced"),
            SyncState::LocalOnly => write!(f, "local-only"),
        }
    }
}
