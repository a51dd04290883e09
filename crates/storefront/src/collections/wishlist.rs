//! Wishlist store.

use chrono::{DateTime, Utc};
use keycraft_core::{CollectionKind, ProductId, WishlistEntry};

use super::Collection;

/// Ordered wishlist entries, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistStore {
    entries: Vec<WishlistEntry>,
}

impl WishlistStore {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry. Adding a product that is already present is a no-op.
    ///
    /// Returns `true` if the entry was added.
    pub fn add(&mut self, entry: WishlistEntry) -> bool {
        if self.contains(entry.product_id()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry for `product_id`. Returns `true` if one was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.product_id() != product_id);
        self.entries.len() != before
    }

    /// Returns `true` if `product_id` is in the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|entry| entry.product_id() == product_id)
    }

    /// Look up the entry for `product_id`.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&WishlistEntry> {
        self.entries.iter().find(|entry| entry.product_id() == product_id)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Replace the whole wishlist, dropping duplicate products.
    pub fn replace(&mut self, entries: Vec<WishlistEntry>) {
        self.entries.clear();
        for entry in entries {
            self.add(entry);
        }
    }
}

impl Collection for WishlistStore {
    const KIND: CollectionKind = CollectionKind::Wishlist;
    type Record = WishlistEntry;

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn to_records(&self) -> Vec<WishlistEntry> {
        self.entries.clone()
    }

    fn from_records(records: Vec<WishlistEntry>, _loaded_at: DateTime<Utc>) -> Self {
        let mut store = Self::new();
        store.replace(records);
        store
    }
}
