//! Durable key-value persistence for collection snapshots.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the medium contract (`get` / `set` / `delete`).
//!   Implementations: [`MemoryStore`] and [`FileStore`].
//! - [`Storage`] is the cloneable handle the rest of the crate uses. It owns
//!   the medium plus the set of claimed keys, so two providers can never
//!   write the same global key on the same medium at once.
//! - [`bridge`] encodes and decodes tagged snapshots and rehydrates
//!   collections, discarding malformed data.
//! - [`debounce`] coalesces rapid writes into one.

pub mod bridge;
pub mod debounce;
mod file;
mod memory;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

pub use debounce::{DebouncedWriter, PendingWrite};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key cannot be mapped onto the medium.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// A persistence medium holding serialized snapshots by key.
///
/// Implementations must treat deleting a missing key as success.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a persistence medium.
#[derive(Clone)]
pub struct Storage {
    medium: Arc<dyn KeyValueStore>,
    claims: Arc<Mutex<HashSet<String>>>,
}

impl Storage {
    /// Wrap a medium.
    pub fn new(medium: impl KeyValueStore + 'static) -> Self {
        Self::from_arc(Arc::new(medium))
    }

    /// Wrap a medium that is also referenced elsewhere (e.g. by tests).
    #[must_use]
    pub fn from_arc(medium: Arc<dyn KeyValueStore>) -> Self {
        Self {
            medium,
            claims: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// In-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns the medium's error if the read fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.medium.get(key).await
    }

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns the medium's error if the write fails.
    pub async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.medium.set(key, value).await
    }

    /// Delete a value.
    ///
    /// # Errors
    ///
    /// Returns the medium's error if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.medium.delete(key).await
    }

    /// Claim exclusive ownership of `key` on this medium.
    ///
    /// Returns `None` if the key is already claimed. The claim is released
    /// when the returned guard is dropped.
    #[must_use]
    pub fn claim(&self, key: &str) -> Option<KeyClaim> {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        if !claims.insert(key.to_owned()) {
            return None;
        }
        Some(KeyClaim {
            key: key.to_owned(),
            claims: Arc::clone(&self.claims),
        })
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

/// Exclusive claim on a storage key, released on drop.
#[derive(Debug)]
pub struct KeyClaim {
    key: String,
    claims: Arc<Mutex<HashSet<String>>>,
}

impl KeyClaim {
    /// The claimed key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyClaim {
    fn drop(&mut self) {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
