//! In-memory doubles for the remote store and the auth provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tabmark_core::{
    AuthProvider, Bookmark, BookmarkDocument, BookmarkTab, RemoteStore, StorageError,
};
use tokio::sync::{Notify, Semaphore};

/// A document whose tabs are named (and keyed) by `names`, each holding one
/// bookmark.
pub fn doc_with_tabs(names: &[&str]) -> BookmarkDocument {
    BookmarkDocument {
        tabs: names
            .iter()
            .map(|name| BookmarkTab {
                id: name.to_string(),
                name: name.to_string(),
                bookmarks: vec![Bookmark::new(
                    format!("{}-1", name),
                    format!("{} home", name),
                    "example.com",
                )],
            })
            .collect(),
        active_tab_id: names.first().map(|name| name.to_string()),
    }
}

/// Remote store holding the raw JSON of one document.
pub struct MemoryRemote {
    raw: Mutex<Option<String>>,
    load_error: Mutex<Option<StorageError>>,
    save_error: Mutex<Option<StorageError>>,
    loads: AtomicUsize,
    saved: Mutex<Vec<BookmarkDocument>>,
    save_started: Notify,
    held: AtomicBool,
    gate: Semaphore,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            raw: Mutex::new(None),
            load_error: Mutex::new(None),
            save_error: Mutex::new(None),
            loads: AtomicUsize::new(0),
            saved: Mutex::new(Vec::new()),
            save_started: Notify::new(),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn with_document(doc: BookmarkDocument) -> Self {
        let remote = Self::new();
        remote.set_raw(&doc.encode().unwrap());
        remote
    }

    pub fn set_raw(&self, json: &str) {
        *self.raw.lock().unwrap() = Some(json.to_string());
    }

    pub fn fail_loads(&self, err: StorageError) {
        *self.load_error.lock().unwrap() = Some(err);
    }

    pub fn fail_saves(&self, err: StorageError) {
        *self.save_error.lock().unwrap() = Some(err);
    }

    /// Block every save until `release_saves`.
    pub fn hold_saves(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_saves(&self) {
        self.held.store(false, Ordering::SeqCst);
        // Closing wakes every waiter at once.
        self.gate.close();
    }

    /// Resolves once a save has been entered (remembered if it already was).
    pub async fn wait_for_save_started(&self) {
        self.save_started.notified().await;
    }

    /// The stored document, decoded.
    pub fn document(&self) -> Option<BookmarkDocument> {
        self.raw
            .lock()
            .unwrap()
            .as_deref()
            .map(|raw| BookmarkDocument::decode(raw).unwrap())
    }

    /// Every document a save was attempted with, in order.
    pub fn saved(&self) -> Vec<BookmarkDocument> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, _key: &str) -> Result<Option<BookmarkDocument>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.load_error.lock().unwrap().clone() {
            return Err(err);
        }
        let raw = self.raw.lock().unwrap().clone();
        raw.map(|raw| BookmarkDocument::decode(&raw)).transpose()
    }

    async fn save(&self, _key: &str, doc: &BookmarkDocument) -> Result<(), StorageError> {
        self.saved.lock().unwrap().push(doc.clone());
        self.save_started.notify_one();

        if self.held.load(Ordering::SeqCst) {
            let _ = self.gate.acquire().await;
        }

        if let Some(err) = self.save_error.lock().unwrap().clone() {
            return Err(err);
        }
        *self.raw.lock().unwrap() = Some(doc.encode()?);
        Ok(())
    }
}

/// Auth provider with scripted outcomes.
pub struct FakeAuth {
    cached: bool,
    grant: bool,
    signed_in: AtomicBool,
    authenticates: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    /// No cached credential; interactive sign-in succeeds.
    pub fn signed_out() -> Self {
        Self::build(false)
    }

    /// A valid cached credential is available.
    pub fn cached() -> Self {
        Self::build(true)
    }

    fn build(cached: bool) -> Self {
        Self {
            cached,
            grant: true,
            signed_in: AtomicBool::new(false),
            authenticates: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Make interactive sign-in fail.
    pub fn deny_sign_in(mut self) -> Self {
        self.grant = false;
        self
    }

    pub fn authenticate_count(&self) -> usize {
        self.authenticates.load(Ordering::SeqCst)
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn authenticate(&self) -> bool {
        self.authenticates.fetch_add(1, Ordering::SeqCst);
        self.signed_in.store(self.cached, Ordering::SeqCst);
        self.cached
    }

    async fn sign_in(&self) -> bool {
        if self.grant {
            self.signed_in.store(true, Ordering::SeqCst);
        }
        self.grant
    }

    async fn sign_out(&self) {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.signed_in.store(false, Ordering::SeqCst);
    }

    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }
}
