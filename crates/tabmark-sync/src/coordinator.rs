use std::sync::{Arc, PoisonError, RwLock};

use tabmark_core::{
    AuthProvider, BookmarkDocument, PersistenceStore, RemoteStore, StorageError,
    REMOTE_DOCUMENT_NAME,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::error::SyncError;
use crate::event::{FailureKind, SyncEvent};
use crate::push::PushQueue;
use crate::state::SyncState;

const EVENT_CAPACITY: usize = 64;

/// Owns the merge policy between local storage and the remote store.
///
/// Built from injected stores and owned by the host application. The
/// coordinator never edits document contents; it only decides which copy is
/// authoritative and moves whole documents between the two.
pub struct SyncCoordinator {
    local: Arc<dyn PersistenceStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    remote_key: String,
    state: RwLock<SyncState>,
    document: RwLock<BookmarkDocument>,
    events: broadcast::Sender<SyncEvent>,
    pushes: PushQueue,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("local", &self.local.backend_name())
            .field("remote", &self.remote.backend_name())
            .field("remote_key", &self.remote_key)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    /// Create a coordinator and start its push worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        local: Arc<dyn PersistenceStore>,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let remote_key = REMOTE_DOCUMENT_NAME.to_string();
        let pushes = PushQueue::spawn(
            remote.clone(),
            auth.clone(),
            remote_key.clone(),
            events.clone(),
        );

        Self {
            local,
            remote,
            auth,
            remote_key,
            state: RwLock::new(SyncState::Uninitialized),
            document: RwLock::new(BookmarkDocument::default()),
            events,
            pushes,
        }
    }

    /// Subscribe to transient notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SyncState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The document currently presented to the UI.
    pub fn document(&self) -> BookmarkDocument {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, next: SyncState) {
        let prev = std::mem::replace(
            &mut *self.state.write().unwrap_or_else(PoisonError::into_inner),
            next,
        );
        if prev != next {
            info!("Sync state {} -> {}", prev, next);
            self.emit(SyncEvent::StateChanged(next));
        }
    }

    fn present(&self, doc: BookmarkDocument) {
        *self.document.write().unwrap_or_else(PoisonError::into_inner) = doc;
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn report_write_failure(&self, err: &StorageError) {
        warn!("Local write failed: {}", err);
        self.emit(SyncEvent::WriteFailed {
            message: err.to_string(),
        });
    }

    fn degrade(&self, err: &StorageError) {
        warn!("Sync with {} failed, using local bookmarks: {}", self.remote.backend_name(), err);
        self.emit(SyncEvent::Degraded {
            kind: FailureKind::classify(err),
            message: err.to_string(),
        });
        self.set_state(SyncState::LocalOnly);
    }

    /// Load the local document, then reconcile with the remote one if the
    /// cached credential is still good. Returns the document to present.
    ///
    /// Runs once per session; later calls return the current document.
    #[instrument(skip(self), level = "debug")]
    pub async fn initialize(&self) -> BookmarkDocument {
        if self.state() != SyncState::Uninitialized {
            debug!("Already initialized ({})", self.state());
            return self.document();
        }

        let local = self.local.load();
        debug!(
            "Loaded {} tabs from {} storage",
            local.tabs.len(),
            self.local.backend_name()
        );
        self.present(local.clone());
        self.set_state(SyncState::LocalLoaded);

        self.set_state(SyncState::Authenticating);
        if !self.auth.authenticate().await {
            debug!("Not authenticated, staying local");
            self.set_state(SyncState::LocalOnly);
            return local;
        }

        self.reconcile(local).await
    }

    /// Decide which copy wins and bring the other one in line.
    ///
    /// A non-empty remote replaces local (offline edits from an earlier
    /// session are lost). An empty remote adopts a non-empty local.
    async fn reconcile(&self, local: BookmarkDocument) -> BookmarkDocument {
        // Queued pushes land first so the remote read is not older than local.
        self.pushes.flush().await;

        let remote = match self.remote.load(&self.remote_key).await {
            Ok(remote) => remote.unwrap_or_default(),
            Err(e) => {
                self.degrade(&e);
                return local;
            }
        };

        if !remote.is_empty() {
            if let Err(e) = self.local.save(&remote) {
                self.report_write_failure(&e);
            }
            let tabs = remote.tabs.len();
            self.present(remote.clone());
            info!("Adopted remote bookmarks ({} tabs)", tabs);
            self.emit(SyncEvent::RemoteAdopted { tabs });
            self.set_state(SyncState::Synced);
            return remote;
        }

        if !local.is_empty() {
            if let Err(e) = self.remote.save(&self.remote_key, &local).await {
                self.degrade(&e);
                return local;
            }
            info!("Promoted local bookmarks ({} tabs)", local.tabs.len());
            self.emit(SyncEvent::LocalPromoted {
                tabs: local.tabs.len(),
            });
        } else {
            debug!("Local and remote both empty");
        }

        self.set_state(SyncState::Synced);
        local
    }

    /// Accept a new full document from the UI.
    ///
    /// The local write always happens first. While synced, the document is
    /// then queued for a background push; the call never waits on the network.
    /// Only a failed local write is returned as an error.
    #[instrument(skip(self, doc), level = "debug", fields(tabs = doc.tabs.len()))]
    pub fn on_document_changed(&self, doc: BookmarkDocument) -> Result<(), SyncError> {
        let saved = self.local.save(&doc);
        if let Err(e) = &saved {
            self.report_write_failure(e);
        }

        if self.state().is_synced() {
            let seq = self.pushes.submit(doc.clone());
            debug!("Queued push {}", seq);
        }
        self.present(doc);

        saved.map_err(SyncError::Write)
    }

    /// Interactive sign-in followed by a fresh reconciliation against the
    /// presented document. Returns whether sign-in succeeded.
    #[instrument(skip(self), level = "debug")]
    pub async fn sign_in(&self) -> bool {
        let prev = self.state();
        self.set_state(SyncState::Authenticating);

        if !self.auth.sign_in().await {
            self.emit(SyncEvent::SignInFailed);
            self.set_state(if self.auth.is_authenticated() {
                prev
            } else {
                SyncState::LocalOnly
            });
            return false;
        }

        self.emit(SyncEvent::SignedIn);
        let local = self.document();
        self.reconcile(local).await;
        true
    }

    /// Drop authenticated state and the cached credential. The local document
    /// is untouched.
    #[instrument(skip(self), level = "debug")]
    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
        self.set_state(SyncState::LocalOnly);
        self.emit(SyncEvent::SignedOut);
    }

    /// Wait for queued pushes to finish.
    pub async fn flush(&self) {
        self.pushes.flush().await;
    }
}
