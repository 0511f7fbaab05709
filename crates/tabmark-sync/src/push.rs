use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tabmark_core::{AuthProvider, BookmarkDocument, RemoteStore};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::event::{FailureKind, SyncEvent};

/// A full-document write waiting for the worker.
#[derive(Debug, Clone)]
struct PendingPush {
    seq: u64,
    doc: BookmarkDocument,
}

/// Single-slot queue in front of the remote store.
///
/// One background worker performs the writes, one at a time. Submitting while
/// a write is in flight replaces whatever was still waiting, so superseded
/// documents are never sent and the last submitted document is always the
/// last one written.
pub(crate) struct PushQueue {
    last_seq: AtomicU64,
    pending: watch::Sender<Option<PendingPush>>,
    completed: watch::Receiver<u64>,
}

impl PushQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        key: String,
        events: broadcast::Sender<SyncEvent>,
    ) -> Self {
        let (pending, pending_rx) = watch::channel(None);
        let (completed_tx, completed) = watch::channel(0);

        tokio::spawn(run_worker(
            remote,
            auth,
            key,
            events,
            pending_rx,
            completed_tx,
        ));

        Self {
            last_seq: AtomicU64::new(0),
            pending,
            completed,
        }
    }

    /// Queue `doc` for pushing and return its sequence number.
    pub(crate) fn submit(&self, doc: BookmarkDocument) -> u64 {
        let seq = self.last_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.send_replace(Some(PendingPush { seq, doc }));
        seq
    }

    /// Wait until everything submitted so far has been written or dropped.
    pub(crate) async fn flush(&self) {
        let target = self.last_seq.load(Ordering::SeqCst);
        let mut completed = self.completed.clone();
        let reached = completed.wait_for(|done| *done >= target).await.is_ok();
        if !reached {
            warn!("Push worker stopped before push {} completed", target);
        }
    }
}

async fn run_worker(
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    key: String,
    events: broadcast::Sender<SyncEvent>,
    mut pending: watch::Receiver<Option<PendingPush>>,
    completed: watch::Sender<u64>,
) {
    let mut last_done = 0;
    while pending.changed().await.is_ok() {
        let next = pending.borrow_and_update().clone();
        let Some(push) = next else {
            continue;
        };
        if push.seq > last_done + 1 {
            debug!(
                "Coalesced pushes {}..{} into {}",
                last_done + 1,
                push.seq - 1,
                push.seq
            );
        }

        if !auth.is_authenticated() {
            debug!("Dropping push {}: signed out", push.seq);
        } else {
            match remote.save(&key, &push.doc).await {
                Ok(()) => {
                    debug!("Push {} written to {}", push.seq, remote.backend_name());
                    let _ = events.send(SyncEvent::Pushed { seq: push.seq });
                }
                Err(e) => {
                    warn!("Push {} failed: {}", push.seq, e);
                    let _ = events.send(SyncEvent::PushFailed {
                        seq: push.seq,
                        kind: FailureKind::classify(&e),
                        message: e.to_string(),
                    });
                }
            }
        }

        last_done = push.seq;
        completed.send_replace(push.seq);
    }
    debug!("Push worker stopped");
}
