use std::fmt::Write as _;

use tabmark_core::{Bookmark, BookmarkDocument, DocumentError, IdGenerator};

use crate::config::Command;

/// Apply an editing command to `doc`. Returns `None` for commands that don't
/// edit the document.
pub fn apply(
    command: &Command,
    doc: &BookmarkDocument,
    ids: &IdGenerator,
) -> Option<Result<BookmarkDocument, DocumentError>> {
    let doc = doc.clone().ensure_default_tab();
    let edited = match command {
        Command::AddTab { name } => doc.with_tab_added(ids.next_id(), name.trim()),
        Command::DeleteTab { tab_id } => doc.without_tab(tab_id),
        Command::SelectTab { tab_id } => doc.with_active_tab(tab_id),
        Command::AddBookmark { name, url, tab } => {
            let tab_id = target_tab(&doc, tab.as_deref());
            doc.with_bookmark_added(&tab_id, Bookmark::new(ids.next_id(), name.trim(), url))
        }
        Command::DeleteBookmark { bookmark_id, tab } => {
            let tab_id = target_tab(&doc, tab.as_deref());
            doc.without_bookmark(&tab_id, bookmark_id)
        }
        Command::Show | Command::SignIn | Command::SignOut => return None,
    };
    Some(edited)
}

fn target_tab(doc: &BookmarkDocument, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| doc.active_tab().map(|t| t.id.clone()))
        .unwrap_or_default()
}

/// Plain-text listing, active tab marked with `*`.
pub fn render(doc: &BookmarkDocument) -> String {
    let doc = doc.clone().ensure_default_tab();
    let active = doc.active_tab().map(|t| t.id.clone());

    let mut out = String::new();
    for tab in &doc.tabs {
        let marker = if active.as_deref() == Some(tab.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {} [{}]", marker, tab.name, tab.id);
        if tab.bookmarks.is_empty() {
            let _ = writeln!(out, "    (no bookmarks)");
        }
        for bookmark in &tab.bookmarks {
            let _ = writeln!(out, "    {} <{}> [{}]", bookmark.name, bookmark.url, bookmark.id);
        }
    }
    out
}
