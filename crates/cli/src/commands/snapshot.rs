//! Stored snapshot inspection.
//!
//! # Usage
//!
//! ```bash
//! kc-cli snapshot show cart
//! kc-cli --data-dir /var/lib/keycraft snapshot clear wishlist
//! ```

use std::path::Path;

use clap::ValueEnum;
use keycraft_core::CollectionKind;
use keycraft_storefront::models::storage_keys;
use keycraft_storefront::persistence::{FileStore, KeyValueStore, StorageError};

/// Snapshot keys that can be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotKey {
    Cart,
    Wishlist,
    User,
}

impl SnapshotKey {
    /// Storage key on the medium.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Cart => CollectionKind::Cart.storage_key(),
            Self::Wishlist => CollectionKind::Wishlist.storage_key(),
            Self::User => storage_keys::USER,
        }
    }
}

/// Stored snapshot for `key`, pretty-printed when it is valid JSON.
///
/// # Errors
///
/// Returns `StorageError` if the snapshot cannot be read.
pub async fn show(data_dir: &Path, key: SnapshotKey) -> Result<Option<String>, StorageError> {
    let store = FileStore::new(data_dir);
    let Some(raw) = store.get(key.storage_key()).await? else {
        return Ok(None);
    };
    let pretty = serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or(raw);
    Ok(Some(pretty))
}

/// Delete the stored snapshot for `key`. Deleting a missing snapshot succeeds.
///
/// # Errors
///
/// Returns `StorageError` if the snapshot file cannot be removed.
pub async fn clear(data_dir: &Path, key: SnapshotKey) -> Result<(), StorageError> {
    FileStore::new(data_dir).delete(key.storage_key()).await?;
    tracing::info!(key = key.storage_key(), dir = %data_dir.display(), "Snapshot cleared");
    Ok(())
}
