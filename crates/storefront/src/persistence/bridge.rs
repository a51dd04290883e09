//! Snapshot encoding and rehydration.
//!
//! A snapshot is stored as `{"kind": "cart", "items": [...]}`. Bare JSON
//! arrays (the legacy format) are still accepted on load.
//! Anything else is malformed: it is deleted and the collection starts empty.

use chrono::Utc;
use keycraft_core::CollectionKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{PendingWrite, Storage};
use crate::collections::Collection;

/// Why a stored snapshot was rejected.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not valid JSON, or items don't match the record schema.
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// The snapshot belongs to a different collection.
    #[error("snapshot kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: CollectionKind,
        found: CollectionKind,
    },
}

/// Tagged snapshot envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot<R> {
    pub kind: CollectionKind,
    pub items: Vec<R>,
}

/// Decode a raw stored value into records for collection `C`.
///
/// # Errors
///
/// Returns [`SnapshotError`] if the value is not a valid snapshot for `C`.
pub fn decode<C: Collection>(raw: &str) -> Result<Vec<C::Record>, SnapshotError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }

    let snapshot: Snapshot<C::Record> = serde_json::from_value(value)?;
    if snapshot.kind != C::KIND {
        return Err(SnapshotError::KindMismatch {
            expected: C::KIND,
            found: snapshot.kind,
        });
    }
    Ok(snapshot.items)
}

/// Encode `collection` into the write that persists it.
///
/// An empty collection becomes a delete, so "emptied" and "never used" both
/// leave the key absent.
///
/// # Errors
///
/// Returns a serialization error if a record cannot be encoded.
pub fn encode<C: Collection>(collection: &C) -> Result<PendingWrite, serde_json::Error> {
    if collection.is_empty() {
        return Ok(PendingWrite::Delete);
    }
    let snapshot = Snapshot {
        kind: C::KIND,
        items: collection.to_records(),
    };
    serde_json::to_string(&snapshot).map(PendingWrite::Put)
}

/// Rehydrate collection `C` from `storage`.
///
/// Never fails: a read error or malformed snapshot is logged, the stored
/// value is discarded, and an empty collection is returned.
pub async fn load<C: Collection>(storage: &Storage) -> C {
    let key = C::KIND.storage_key();

    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "No stored snapshot");
            return C::default();
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read snapshot, discarding");
            discard(storage, key).await;
            return C::default();
        }
    };

    match decode::<C>(&raw) {
        Ok(records) => C::from_records(records, Utc::now()),
        Err(e) => {
            warn!(key, error = %e, "Discarding corrupt snapshot");
            discard(storage, key).await;
            C::default()
        }
    }
}

async fn discard(storage: &Storage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        warn!(key, error = %e, "Failed to delete corrupt snapshot");
    }
}
