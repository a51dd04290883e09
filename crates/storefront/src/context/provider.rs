//! Persisted collection providers.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use keycraft_core::{CartLine, ItemDetails, LineId, Price, ProductId, WishlistEntry};
use tracing::{debug, warn};

use super::ContextError;
use crate::collections::{CartStore, Collection, WishlistStore};
use crate::persistence::{DebouncedWriter, KeyClaim, Storage, bridge};

/// Cart provider.
pub type CartProvider = Provider<CartStore>;

/// Local wishlist provider.
pub type WishlistProvider = Provider<WishlistStore>;

/// Owner of one collection: the in-memory store plus its debounced writer.
///
/// Holds the claim on the collection's storage key for its whole lifetime,
/// so only one provider per key can exist on a storage medium.
pub struct Provider<C: Collection> {
    store: Mutex<C>,
    writer: DebouncedWriter,
    _claim: KeyClaim,
}

impl<C: Collection> Provider<C> {
    /// Claim the collection's key, rehydrate it, and start its writer.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::AlreadyMounted` if another provider holds the
    /// key on this storage medium.
    pub async fn mount(storage: &Storage, debounce: Duration) -> Result<Self, ContextError> {
        let key = C::KIND.storage_key();
        let claim = storage
            .claim(key)
            .ok_or_else(|| ContextError::AlreadyMounted(key.to_string()))?;

        let store = bridge::load::<C>(storage).await;
        debug!(key, items = store.len(), "Collection mounted");

        Ok(Self {
            store: Mutex::new(store),
            writer: DebouncedWriter::spawn(storage.clone(), key, debounce),
            _claim: claim,
        })
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.lock())
    }

    /// Apply `f` and schedule a snapshot of the resulting state.
    ///
    /// The snapshot is taken under the same lock as the mutation, so the
    /// pending write always matches the latest state.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut store = self.lock();
        let result = f(&mut store);
        match bridge::encode(&*store) {
            Ok(write) => self.writer.schedule(write),
            Err(e) => warn!(key = C::KIND.storage_key(), error = %e, "Failed to encode snapshot"),
        }
        result
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write any pending snapshot now.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Flush and release the storage key. Persisted data is kept.
    pub async fn unmount(self) {
        self.flush().await;
        debug!(key = C::KIND.storage_key(), "Collection unmounted");
    }

    fn lock(&self) -> MutexGuard<'_, C> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Collection> std::fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &C::KIND)
            .field("items", &self.len())
            .finish_non_exhaustive()
    }
}

impl Provider<CartStore> {
    /// Add `quantity` of `item`, merging with an identical line.
    pub fn add(&self, item: ItemDetails, quantity: u32) -> LineId {
        self.mutate(|cart| cart.add(item, quantity))
    }

    /// Add with a caller-chosen line id for a new line.
    pub fn add_with_line_id(
        &self,
        item: ItemDetails,
        quantity: u32,
        line_id: Option<LineId>,
    ) -> LineId {
        self.mutate(|cart| cart.add_with_line_id(item, quantity, line_id))
    }

    /// Remove by line id, falling back to product id.
    pub fn remove(&self, id: &str) -> bool {
        self.mutate(|cart| cart.remove(id))
    }

    /// Set a line's quantity; below 1 removes it.
    pub fn update_quantity(&self, id: &str, quantity: i64) -> bool {
        self.mutate(|cart| cart.update_quantity(id, quantity))
    }

    pub fn clear(&self) {
        self.mutate(CartStore::clear);
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.read(|cart| cart.lines().to_vec())
    }

    pub fn subtotal(&self) -> Price {
        self.read(CartStore::subtotal)
    }

    pub fn item_count(&self) -> u32 {
        self.read(CartStore::item_count)
    }
}

impl Provider<WishlistStore> {
    /// Add an entry; no-op if the product is already present.
    pub fn add(&self, entry: WishlistEntry) -> bool {
        self.mutate(|wishlist| wishlist.add(entry))
    }

    pub fn remove(&self, product_id: &ProductId) -> bool {
        self.mutate(|wishlist| wishlist.remove(product_id))
    }

    pub fn clear(&self) {
        self.mutate(WishlistStore::clear);
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.read(|wishlist| wishlist.contains(product_id))
    }

    pub fn get(&self, product_id: &ProductId) -> Option<WishlistEntry> {
        self.read(|wishlist| wishlist.get(product_id).cloned())
    }

    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.read(|wishlist| wishlist.entries().to_vec())
    }
}
