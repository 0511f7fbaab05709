use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tabmark_core::StorageError;
use tracing::{debug, instrument};

/// Raw named slots holding one string value each.
pub trait SlotStorage: Send + Sync {
    /// Returns the backend identifier (e.g., "file", "memory").
    fn backend_name(&self) -> &'static str;

    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Bytes currently held by a slot, 0 when missing.
    fn size(&self, key: &str) -> Result<u64, StorageError>;
}

/// File-backed slots.
///
/// Layout:
/// ```text
/// {base_dir}/
///   bookmarkData.json
///   google_drive_token.json
/// ```
#[derive(Debug, Clone)]
pub struct FileSlots {
    base_dir: PathBuf,
}

impl FileSlots {
    /// Create file slots rooted at `base_dir`. The directory is created on first write.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to a slot file.
    fn slot_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }

    fn ensure_base_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_dir).map_err(|e| {
            StorageError::Io(format!(
                "Failed to create data dir {}: {}",
                self.base_dir.display(),
                e
            ))
        })
    }
}

impl SlotStorage for FileSlots {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self), level = "debug")]
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => {
                debug!("Read slot {} ({} bytes)", key, value.len());
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_base_dir()?;
        let path = self.slot_path(key);

        // Write atomically via temp file
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &path).map_err(|e| {
            StorageError::Io(format!("Failed to rename to {}: {}", path.display(), e))
        })?;

        debug!("Wrote slot {} ({} bytes)", key, value.len());
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed slot {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn size(&self, key: &str) -> Result<u64, StorageError> {
        match fs::metadata(self.slot_path(key)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::Io(format!("Failed to get metadata: {}", e))),
        }
    }
}

/// In-memory slots.
#[derive(Debug, Default)]
pub struct MemorySlots {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemorySlots {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }

    fn size(&self, key: &str) -> Result<u64, StorageError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).map(|v| v.len() as u64).unwrap_or(0))
    }
}
