//! In-memory collection stores for the cart and the wishlist.
//!
//! Stores are plain synchronous data structures enforcing identity and merge
//! rules. They know nothing about persistence; the provider layer wraps them
//! and schedules snapshot writes after each mutation.

mod cart;
mod wishlist;

use chrono::{DateTime, Utc};
use keycraft_core::CollectionKind;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use cart::{CartRecord, CartStore};
pub use wishlist::WishlistStore;

/// A collection that can be snapshotted and rehydrated.
pub trait Collection: Default + Send + Sync + 'static {
    /// Snapshot tag, also selecting the global storage key.
    const KIND: CollectionKind;

    /// Persisted shape of one item.
    type Record: Serialize + DeserializeOwned + Send + Sync;

    /// Number of items.
    fn len(&self) -> usize;

    /// Returns `true` if the collection holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current items as persisted records, in display order.
    fn to_records(&self) -> Vec<Self::Record>;

    /// Rebuild a collection from persisted records.
    ///
    /// `loaded_at` is the load-time discriminator used to backfill missing
    /// identities.
    fn from_records(records: Vec<Self::Record>, loaded_at: DateTime<Utc>) -> Self;
}
