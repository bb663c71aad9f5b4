//! File-based key-value backend for persistent storage.

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A directory-backed key-value backend.
///
/// Each key is stored in its own file, `<dir>/<key>.json`. Data survives
/// process restarts.
///
/// # Durability
///
/// `put` writes to a temporary file, calls `File::sync_all()`, then renames
/// it over the previous value, so a crash leaves either the old or the new
/// value and never a torn one.
///
/// # Example
///
/// ```no_run
/// use todo_store::{FileBackend, KeyValueBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new(".todo-sync")).unwrap();
/// backend.put("store", br#"{"todos": []}"#).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a backend rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that holds `key`.
    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("state");

        let backend = FileBackend::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.dir(), root.as_path());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        assert_eq!(backend.get("store").unwrap(), None);
        backend.put("store", b"hello").unwrap();
        assert_eq!(backend.get("store").unwrap(), Some(b"hello".to_vec()));
        assert!(dir.path().join("store.json").exists());
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[test]
    fn file_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.put("config", b"persisted").unwrap();
        }
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("config").unwrap(), Some(b"persisted".to_vec()));
    }

    #[test]
    fn file_remove() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.put("store", b"x").unwrap();
        backend.remove("store").unwrap();
        backend.remove("store").unwrap();
        assert_eq!(backend.get("store").unwrap(), None);
    }

    #[test]
    fn file_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.put("../escape", b"x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(backend.get(""), Err(StoreError::InvalidKey(_))));
    }
}
