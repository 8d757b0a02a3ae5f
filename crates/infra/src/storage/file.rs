use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use backoffice_core::SessionStorage;
use backoffice_domain::StorageError;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Session keys kept in a single JSON object on disk.
///
/// Every write replaces the file atomically (temp file in the same
/// directory, then rename), so a crash never leaves half a session behind.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStorage {
    /// Load `path`, or start empty when it does not exist yet.
    ///
    /// # Errors
    /// `Read` when the file cannot be read; `Corrupt` when it is not a JSON
    /// object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::Read {
                    key: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "Session file loaded");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_error = |message: String| StorageError::Write { key: key.to_string(), message };

        let json = serde_json::to_vec_pretty(entries).map_err(|e| write_error(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| write_error(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_error(e.to_string()))?;
        tmp.write_all(&json).map_err(|e| write_error(e.to_string()))?;
        tmp.as_file().sync_all().map_err(|e| write_error(e.to_string()))?;
        tmp.persist(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Session file rename failed");
            write_error(e.to_string())
        })?;
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(key, &next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(key, &next)?;
        *entries = next;
        Ok(())
    }
}
