//! In-memory key-value backend for testing.

use crate::backend::KeyValueBackend;
use crate::error::StoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An in-memory key-value backend.
///
/// Suitable for unit tests, integration tests and ephemeral stores. Writes
/// can be made to fail on demand to exercise rollback paths.
///
/// # Example
///
/// ```rust
/// use todo_store::{InMemoryBackend, KeyValueBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put("store", b"{}").unwrap();
/// assert_eq!(backend.get("store").unwrap(), Some(b"{}".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with one preloaded entry.
    ///
    /// Useful for testing migrations of previously written records.
    #[must_use]
    pub fn with_entry(key: &str, value: &[u8]) -> Self {
        let backend = Self::new();
        backend
            .entries
            .write()
            .insert(key.to_string(), value.to_vec());
        backend
    }

    /// Makes every subsequent `put` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the raw value under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }
}

impl KeyValueBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(std::io::Error::other(format!("injected write failure for {key}")).into());
        }
        self.entries.write().insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.get("store").unwrap(), None);
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn memory_put_replaces() {
        let backend = InMemoryBackend::new();
        backend.put("config", b"one").unwrap();
        backend.put("config", b"two").unwrap();
        assert_eq!(backend.get("config").unwrap(), Some(b"two".to_vec()));
        assert_eq!(backend.write_count(), 2);
    }

    #[test]
    fn memory_remove_is_idempotent() {
        let backend = InMemoryBackend::with_entry("store", b"{}");
        backend.remove("store").unwrap();
        backend.remove("store").unwrap();
        assert_eq!(backend.get("store").unwrap(), None);
    }

    #[test]
    fn memory_injected_failure_keeps_old_value() {
        let backend = InMemoryBackend::with_entry("store", b"old");
        backend.set_fail_writes(true);
        assert!(backend.put("store", b"new").is_err());
        assert_eq!(backend.raw("store"), Some(b"old".to_vec()));

        backend.set_fail_writes(false);
        backend.put("store", b"new").unwrap();
        assert_eq!(backend.raw("store"), Some(b"new".to_vec()));
    }
}
