//! Configuration store implementations.
//!
//! - [`MemoryStore`] - volatile, for tests and images without flash
//! - [`FileStore`] - one file, replaced atomically via rename

use modus_common::store::{ConfigStore, StoreError};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Vec<u8>, StoreError> {
        self.data.lock().clone().ok_or(StoreError::NotFound)
    }

    fn save(&self, data: &[u8]) -> Result<(), StoreError> {
        *self.data.lock() = Some(data.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.data.lock() = None;
        Ok(())
    }
}

/// File-backed store.
///
/// Saves write a sibling temporary file and rename it over the target so a
/// power cut leaves either the old or the new blob, never a torn one.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> Result<Vec<u8>, StoreError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn save(&self, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!("FileStore: wrote {} bytes to {:?}", data.len(), self.path);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryStore::new();
        assert!(matches!(store.load(), Err(StoreError::NotFound)));
        store.save(b"abc").unwrap();
        assert_eq!(store.load().unwrap(), b"abc");
        store.clear().unwrap();
        assert!(matches!(store.load(), Err(StoreError::NotFound)));
    }

    #[test]
    fn file_store_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("settings.json"));

        assert!(matches!(store.load(), Err(StoreError::NotFound)));
        store.save(b"{\"mode\":1}").unwrap();
        assert_eq!(store.load().unwrap(), b"{\"mode\":1}");
        assert!(!store.temp_path().exists());

        store.save(b"{}").unwrap();
        assert_eq!(store.load().unwrap(), b"{}");

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(matches!(store.load(), Err(StoreError::NotFound)));
    }
}
