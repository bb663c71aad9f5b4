//! Key-value backend trait definition.

use crate::error::StoreResult;
use std::sync::Arc;

/// The host's persistent key-value storage.
///
/// Backends are **opaque byte stores**. They do not interpret values; record
/// encoding and schema versions belong to [`crate::record`].
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for the key
/// - `put` replaces the whole value or leaves the previous value intact
/// - Backends must be `Send + Sync`; they lock internally
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Arc<B> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}
