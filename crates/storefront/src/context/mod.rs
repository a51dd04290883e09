//! Store context distribution.
//!
//! A [`StoreContext`] is built once at the application root and holds the
//! cart provider and the wishlist handle. It is passed down explicitly, and
//! can also be installed as the ambient context of an async task with
//! [`StoreContext::scope`], after which code inside the task reaches it with
//! [`use_cart`] and [`use_wishlist`].
//!
//! Calling [`use_cart`] or [`use_wishlist`] outside a scope is a programming
//! error and panics. Scopes do not nest.

mod provider;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use keycraft_core::{LineId, ProductId, WishlistEntry};

pub use provider::{CartProvider, Provider, WishlistProvider};

use crate::persistence::Storage;
use crate::sync::{RemoteWishlist, SyncOutcome};

tokio::task_local! {
    static CURRENT: StoreContext;
}

/// Errors raised while mounting or installing a context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A scope is already installed on this task.
    #[error("store context scope is already installed on this task")]
    NestedScope,

    /// No scope is installed on this task.
    #[error("store context used outside of a scope")]
    OutsideScope,

    /// A provider already owns this storage key.
    #[error("a provider for storage key `{0}` is already mounted")]
    AlreadyMounted(String),
}

/// Wishlist variant in use.
#[derive(Debug)]
pub enum WishlistHandle {
    /// Persisted to the local storage medium.
    Local(WishlistProvider),
    /// Mirrored from the remote table for the signed-in user.
    Remote(RemoteWishlist),
}

impl WishlistHandle {
    /// Add an entry.
    pub async fn add(&self, entry: WishlistEntry) -> SyncOutcome {
        match self {
            Self::Local(provider) => {
                provider.add(entry);
                SyncOutcome::Applied
            }
            Self::Remote(remote) => remote.add(entry).await,
        }
    }

    /// Remove the entry for `product_id`.
    pub async fn remove(&self, product_id: ProductId) -> SyncOutcome {
        match self {
            Self::Local(provider) => {
                provider.remove(&product_id);
                SyncOutcome::Applied
            }
            Self::Remote(remote) => remote.remove(product_id).await,
        }
    }

    /// Remove every entry.
    pub async fn clear(&self) -> SyncOutcome {
        match self {
            Self::Local(provider) => {
                provider.clear();
                SyncOutcome::Applied
            }
            Self::Remote(remote) => remote.clear().await,
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        match self {
            Self::Local(provider) => provider.contains(product_id),
            Self::Remote(remote) => remote.contains(product_id),
        }
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<WishlistEntry> {
        match self {
            Self::Local(provider) => provider.get(product_id),
            Self::Remote(remote) => remote.get(product_id),
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        match self {
            Self::Local(provider) => provider.entries(),
            Self::Remote(remote) => remote.entries(),
        }
    }

    /// The remote adapter, when this is the remote variant.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteWishlist> {
        match self {
            Self::Local(_) => None,
            Self::Remote(remote) => Some(remote),
        }
    }
}

/// Root-owned cart and wishlist, shared by every consumer in a scope.
#[derive(Debug, Clone)]
pub struct StoreContext {
    cart: Arc<CartProvider>,
    wishlist: Arc<WishlistHandle>,
}

impl StoreContext {
    #[must_use]
    pub fn new(cart: CartProvider, wishlist: WishlistHandle) -> Self {
        Self {
            cart: Arc::new(cart),
            wishlist: Arc::new(wishlist),
        }
    }

    /// Mount a cart and a local wishlist on `storage`.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::AlreadyMounted` if either key is already owned
    /// by another provider on this medium.
    pub async fn mount_local(storage: &Storage, debounce: Duration) -> Result<Self, ContextError> {
        let cart = CartProvider::mount(storage, debounce).await?;
        let wishlist = WishlistProvider::mount(storage, debounce).await?;
        Ok(Self::new(cart, WishlistHandle::Local(wishlist)))
    }

    /// Mount a cart on `storage` paired with a remote wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::AlreadyMounted` if the cart key is already
    /// owned by another provider on this medium.
    pub async fn mount_remote(
        storage: &Storage,
        debounce: Duration,
        remote: RemoteWishlist,
    ) -> Result<Self, ContextError> {
        let cart = CartProvider::mount(storage, debounce).await?;
        remote.start().await;
        Ok(Self::new(cart, WishlistHandle::Remote(remote)))
    }

    #[must_use]
    pub fn cart(&self) -> Arc<CartProvider> {
        Arc::clone(&self.cart)
    }

    #[must_use]
    pub fn wishlist(&self) -> Arc<WishlistHandle> {
        Arc::clone(&self.wishlist)
    }

    /// Add the wishlist entry for `product_id` to the cart with quantity 1.
    ///
    /// The wishlist is left unchanged. Returns `None` if the product is not
    /// in the wishlist.
    pub fn move_to_cart(&self, product_id: &ProductId) -> Option<LineId> {
        let entry = self.wishlist.get(product_id)?;
        Some(self.cart.add(entry.item, 1))
    }

    /// Run `future` with this context installed as the task's ambient
    /// context.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NestedScope` if a context is already installed.
    pub async fn scope<F: Future>(self, future: F) -> Result<F::Output, ContextError> {
        if CURRENT.try_with(|_| ()).is_ok() {
            return Err(ContextError::NestedScope);
        }
        Ok(CURRENT.scope(self, future).await)
    }

    /// The ambient context, if a scope is installed.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::OutsideScope` when called outside a scope.
    pub fn try_current() -> Result<Self, ContextError> {
        CURRENT
            .try_with(Clone::clone)
            .map_err(|_| ContextError::OutsideScope)
    }

    /// The ambient context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a scope.
    #[must_use]
    pub fn current() -> Self {
        match Self::try_current() {
            Ok(context) => context,
            Err(e) => panic!("{e}: wrap the caller in StoreContext::scope"),
        }
    }

    /// Write out pending snapshots now.
    pub async fn flush(&self) {
        self.cart.flush().await;
        if let WishlistHandle::Local(provider) = &*self.wishlist {
            provider.flush().await;
        }
    }

    /// Flush pending writes and stop the remote subscription.
    ///
    /// Persisted data is kept. The storage keys are released once the last
    /// clone of this context is dropped.
    pub async fn unmount(&self) {
        self.flush().await;
        if let Some(remote) = self.wishlist.remote() {
            remote.stop();
        }
        info!("Store context unmounted");
    }
}

/// The cart of the ambient context.
///
/// # Panics
///
/// Panics when called outside [`StoreContext::scope`].
#[must_use]
pub fn use_cart() -> Arc<CartProvider> {
    StoreContext::current().cart()
}

/// The wishlist of the ambient context.
///
/// # Panics
///
/// Panics when called outside [`StoreContext::scope`].
#[must_use]
pub fn use_wishlist() -> Arc<WishlistHandle> {
    StoreContext::current().wishlist()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keycraft_core::{ItemDetails, Price};

    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    async fn context() -> StoreContext {
        StoreContext::mount_local(&Storage::memory(), DEBOUNCE)
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_consumers_share_one_store() {
        let ctx = context().await;
        ctx.clone()
            .scope(async {
                use_cart().add(
                    ItemDetails::new("P1", "Keycraft 65", Price::from_cents(1000)),
                    1,
                );
                assert_eq!(use_cart().item_count(), 1);
            })
            .await
            .unwrap();
        assert_eq!(ctx.cart().item_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_scope_is_rejected() {
        let ctx = context().await;
        let inner = ctx.clone();
        let nested = ctx.scope(async move { inner.scope(async {}).await }).await;
        assert!(matches!(nested, Ok(Err(ContextError::NestedScope))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_current_outside_scope() {
        assert!(matches!(
            StoreContext::try_current(),
            Err(ContextError::OutsideScope)
        ));
    }

    #[test]
    #[should_panic(expected = "store context used outside of a scope")]
    fn test_use_cart_outside_scope_panics() {
        let _ = use_cart();
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_to_cart_keeps_wishlist() {
        let ctx = context().await;
        let item = ItemDetails::new("P2", "Keycaps", Price::from_cents(4500));
        assert_eq!(
            ctx.wishlist().add(item.into()).await,
            SyncOutcome::Applied
        );

        let product = ProductId::new("P2");
        assert!(ctx.move_to_cart(&product).is_some());
        assert_eq!(ctx.cart().item_count(), 1);
        assert!(ctx.wishlist().contains(&product));
        assert!(ctx.move_to_cart(&ProductId::new("missing")).is_none());
    }
}
