use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StorageError;

/// Id of the synthetic tab created for legacy documents and empty documents.
pub const DEFAULT_TAB_ID: &str = "default";
/// Name of the synthetic tab created for legacy documents and empty documents.
pub const DEFAULT_TAB_NAME: &str = "General";

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub name: String,
    /// Always carries a scheme, see [`normalize_url`].
    pub url: String,
}

impl Bookmark {
    /// Create a bookmark, normalizing the url.
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: normalize_url(url),
        }
    }
}

/// A named, ordered group of bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkTab {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl BookmarkTab {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bookmarks: Vec::new(),
        }
    }
}

/// The whole bookmark state. Always replaced whole, never patched by the sync layer.
///
/// `active_tab_id` may be absent or point to a tab that no longer exists;
/// readers go through [`BookmarkDocument::active_tab`], which degrades to the
/// first tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkDocument {
    pub tabs: Vec<BookmarkTab>,
    #[serde(
        rename = "activeTabId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_tab_id: Option<String>,
}

/// Errors raised by the document editing helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Cannot delete the last tab")]
    LastTab,

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Tab already exists: {0}")]
    TabExists(String),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
}

/// Versioned on-disk / on-wire shape of the bookmark document.
///
/// The first format was a bare array of bookmarks. It is upgraded on decode
/// into a single `General` tab; the upgraded shape is what gets written back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentShape {
    Legacy(Vec<Bookmark>),
    Current(BookmarkDocument),
}

impl DocumentShape {
    /// Parse raw JSON into one of the known shapes.
    pub fn parse(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json)
            .map_err(|e| StorageError::Parse(format!("Unrecognized bookmark document: {}", e)))
    }

    /// Upgrade to the current document shape.
    pub fn into_document(self) -> BookmarkDocument {
        match self {
            DocumentShape::Current(doc) => doc,
            DocumentShape::Legacy(bookmarks) => BookmarkDocument {
                tabs: vec![BookmarkTab {
                    id: DEFAULT_TAB_ID.to_string(),
                    name: DEFAULT_TAB_NAME.to_string(),
                    bookmarks,
                }],
                active_tab_id: Some(DEFAULT_TAB_ID.to_string()),
            },
        }
    }
}

impl BookmarkDocument {
    /// Decode JSON in either the legacy or the current shape.
    pub fn decode(json: &str) -> Result<Self, StorageError> {
        DocumentShape::parse(json).map(DocumentShape::into_document)
    }

    /// Encode in the current shape, pretty-printed.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize bookmarks: {}", e))
        })
    }

    /// True when the document has no tabs at all.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, tab_id: &str) -> Option<&BookmarkTab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    /// The tab the UI should show: the active one, or the first tab when
    /// `active_tab_id` is missing or stale.
    pub fn active_tab(&self) -> Option<&BookmarkTab> {
        self.active_tab_id
            .as_deref()
            .and_then(|id| self.tab(id))
            .or_else(|| self.tabs.first())
    }

    /// An empty document gets the `General` tab, made active.
    pub fn ensure_default_tab(self) -> Self {
        if !self.tabs.is_empty() {
            return self;
        }
        Self {
            tabs: vec![BookmarkTab::new(DEFAULT_TAB_ID, DEFAULT_TAB_NAME)],
            active_tab_id: Some(DEFAULT_TAB_ID.to_string()),
        }
    }

    /// Append a new empty tab and make it active.
    pub fn with_tab_added(
        &self,
        tab_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        let tab = BookmarkTab::new(tab_id, name);
        if self.tab(&tab.id).is_some() {
            return Err(DocumentError::TabExists(tab.id));
        }

        let mut next = self.clone();
        next.active_tab_id = Some(tab.id.clone());
        next.tabs.push(tab);
        Ok(next)
    }

    /// Remove a tab and its bookmarks.
    ///
    /// The only remaining tab can't be removed. When the removed tab was the
    /// active one, the first remaining tab becomes active.
    pub fn without_tab(&self, tab_id: &str) -> Result<Self, DocumentError> {
        if self.tabs.len() <= 1 {
            return Err(DocumentError::LastTab);
        }
        if self.tab(tab_id).is_none() {
            return Err(DocumentError::TabNotFound(tab_id.to_string()));
        }

        let tabs: Vec<BookmarkTab> = self
            .tabs
            .iter()
            .filter(|t| t.id != tab_id)
            .cloned()
            .collect();

        let active_tab_id = if self.active_tab_id.as_deref() == Some(tab_id) {
            tabs.first().map(|t| t.id.clone())
        } else {
            self.active_tab_id.clone()
        };

        Ok(Self {
            tabs,
            active_tab_id,
        })
    }

    /// Select the active tab.
    pub fn with_active_tab(&self, tab_id: &str) -> Result<Self, DocumentError> {
        if self.tab(tab_id).is_none() {
            return Err(DocumentError::TabNotFound(tab_id.to_string()));
        }
        let mut next = self.clone();
        next.active_tab_id = Some(tab_id.to_string());
        Ok(next)
    }

    /// Replace the bookmark list of one tab.
    pub fn with_bookmarks(
        &self,
        tab_id: &str,
        bookmarks: Vec<Bookmark>,
    ) -> Result<Self, DocumentError> {
        let mut next = self.clone();
        let tab = next
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| DocumentError::TabNotFound(tab_id.to_string()))?;
        tab.bookmarks = bookmarks;
        Ok(next)
    }

    /// Append a bookmark to the end of a tab.
    pub fn with_bookmark_added(
        &self,
        tab_id: &str,
        bookmark: Bookmark,
    ) -> Result<Self, DocumentError> {
        let mut bookmarks = self
            .tab(tab_id)
            .ok_or_else(|| DocumentError::TabNotFound(tab_id.to_string()))?
            .bookmarks
            .clone();
        bookmarks.push(bookmark);
        self.with_bookmarks(tab_id, bookmarks)
    }

    /// Remove a bookmark from a tab.
    pub fn without_bookmark(&self, tab_id: &str, bookmark_id: &str) -> Result<Self, DocumentError> {
        let tab = self
            .tab(tab_id)
            .ok_or_else(|| DocumentError::TabNotFound(tab_id.to_string()))?;
        if !tab.bookmarks.iter().any(|b| b.id == bookmark_id) {
            return Err(DocumentError::BookmarkNotFound(bookmark_id.to_string()));
        }

        let bookmarks = tab
            .bookmarks
            .iter()
            .filter(|b| b.id != bookmark_id)
            .cloned()
            .collect();
        self.with_bookmarks(tab_id, bookmarks)
    }
}

/// Prefix `https://` unless the url already starts with `http`.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tabs() -> BookmarkDocument {
        BookmarkDocument {
            tabs: vec![BookmarkTab::new("a", "Work"), BookmarkTab::new("b", "Home")],
            active_tab_id: Some("b".to_string()),
        }
    }

    #[test]
    fn test_decode_current_shape() {
        let json = r#"{"tabs":[{"id":"t1","name":"Work","bookmarks":[{"id":"1","name":"n","url":"https://u"}]}],"activeTabId":"t1"}"#;
        let doc = BookmarkDocument::decode(json).unwrap();
        assert_eq!(doc.tabs.len(), 1);
        assert_eq!(doc.tabs[0].bookmarks[0].url, "https://u");
        assert_eq!(doc.active_tab_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_decode_legacy_shape() {
        let doc = BookmarkDocument::decode(r#"[{"id":"1","name":"n","url":"u"}]"#).unwrap();

        let expected = BookmarkDocument {
            tabs: vec![BookmarkTab {
                id: "default".to_string(),
                name: "General".to_string(),
                bookmarks: vec![Bookmark {
                    id: "1".to_string(),
                    name: "n".to_string(),
                    url: "u".to_string(),
                }],
            }],
            active_tab_id: Some("default".to_string()),
        };
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            BookmarkDocument::decode("not json"),
            Err(StorageError::Parse(_))
        ));
        assert!(BookmarkDocument::decode(r#"{"foo":1}"#).is_err());
        assert!(BookmarkDocument::decode("null").is_err());
    }

    #[test]
    fn test_encode_writes_current_shape() {
        let legacy = BookmarkDocument::decode(r#"[{"id":"1","name":"n","url":"u"}]"#).unwrap();
        let json = legacy.encode().unwrap();
        assert!(json.contains("\"activeTabId\": \"default\""));
        assert_eq!(BookmarkDocument::decode(&json).unwrap(), legacy);
    }

    #[test]
    fn test_missing_active_tab_is_not_serialized() {
        let doc = BookmarkDocument::default();
        let json = doc.encode().unwrap();
        assert!(!json.contains("activeTabId"));
    }

    #[test]
    fn test_active_tab_degrades_when_stale() {
        let mut doc = two_tabs();
        assert_eq!(doc.active_tab().unwrap().id, "b");

        doc.active_tab_id = Some("gone".to_string());
        assert_eq!(doc.active_tab().unwrap().id, "a");

        doc.active_tab_id = None;
        assert_eq!(doc.active_tab().unwrap().id, "a");

        assert!(BookmarkDocument::default().active_tab().is_none());
    }

    #[test]
    fn test_ensure_default_tab() {
        let doc = BookmarkDocument::default().ensure_default_tab();
        assert_eq!(doc.tabs.len(), 1);
        assert_eq!(doc.tabs[0].id, DEFAULT_TAB_ID);
        assert_eq!(doc.tabs[0].name, DEFAULT_TAB_NAME);
        assert_eq!(doc.active_tab_id.as_deref(), Some(DEFAULT_TAB_ID));

        let untouched = two_tabs().ensure_default_tab();
        assert_eq!(untouched, two_tabs());
    }

    #[test]
    fn test_add_tab_becomes_active() {
        let doc = two_tabs().with_tab_added("c", "Reading").unwrap();
        assert_eq!(doc.tabs.len(), 3);
        assert_eq!(doc.tabs[2].id, "c");
        assert_eq!(doc.active_tab_id.as_deref(), Some("c"));

        let err = doc.with_tab_added("a", "Dup").unwrap_err();
        assert_eq!(err, DocumentError::TabExists("a".to_string()));
    }

    #[test]
    fn test_delete_last_tab_rejected() {
        let doc = BookmarkDocument::default().ensure_default_tab();
        assert_eq!(doc.without_tab(DEFAULT_TAB_ID), Err(DocumentError::LastTab));
    }

    #[test]
    fn test_delete_active_tab_reassigns_first() {
        let doc = two_tabs().with_tab_added("c", "Reading").unwrap();
        let doc = doc.without_tab("c").unwrap();
        assert_eq!(doc.tabs.len(), 2);
        assert_eq!(doc.active_tab_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_delete_inactive_tab_keeps_active() {
        let doc = two_tabs().without_tab("a").unwrap();
        assert_eq!(doc.tabs.len(), 1);
        assert_eq!(doc.active_tab_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_delete_unknown_tab() {
        assert_eq!(
            two_tabs().without_tab("zzz"),
            Err(DocumentError::TabNotFound("zzz".to_string()))
        );
    }

    #[test]
    fn test_select_tab() {
        let doc = two_tabs().with_active_tab("a").unwrap();
        assert_eq!(doc.active_tab_id.as_deref(), Some("a"));
        assert!(doc.with_active_tab("nope").is_err());
    }

    #[test]
    fn test_bookmark_add_and_remove() {
        let doc = two_tabs()
            .with_bookmark_added("a", Bookmark::new("1", "Rust", "rust-lang.org"))
            .unwrap()
            .with_bookmark_added("a", Bookmark::new("2", "Docs", "https://docs.rs"))
            .unwrap();

        let tab = doc.tab("a").unwrap();
        assert_eq!(tab.bookmarks.len(), 2);
        assert_eq!(tab.bookmarks[0].url, "https://rust-lang.org");
        assert_eq!(tab.bookmarks[1].id, "2");
        assert!(doc.tab("b").unwrap().bookmarks.is_empty());

        let doc = doc.without_bookmark("a", "1").unwrap();
        assert_eq!(doc.tab("a").unwrap().bookmarks.len(), 1);
        assert_eq!(
            doc.without_bookmark("a", "1"),
            Err(DocumentError::BookmarkNotFound("1".to_string()))
        );
        assert!(doc.with_bookmark_added("x", Bookmark::new("3", "n", "u")).is_err());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com "), "https://example.com");
    }
}
