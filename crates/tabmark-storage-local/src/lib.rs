//! Local storage backend for tabmark.
//!
//! Mirrors browser local storage: a handful of named slots, each holding one
//! JSON value, with an optional byte quota across all slots.
//! - `FileSlots`: one `{key}.json` file per slot in a data directory
//! - `MemorySlots`: process-local slots, for embedding and tests

mod slots;
mod store;

pub use slots::{FileSlots, MemorySlots, SlotStorage};
pub use store::{LocalStore, DEFAULT_QUOTA_BYTES};
