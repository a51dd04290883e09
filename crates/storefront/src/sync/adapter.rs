//! Wishlist mirror for the signed-in user.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use keycraft_core::{ProductId, WishlistEntry};

use super::{ChangeEvent, SyncOutcome, WishlistTable};
use crate::collections::WishlistStore;
use crate::services::auth::SessionProvider;

/// Remote-backed wishlist.
///
/// Reads come from an in-memory copy of the user's rows. Mutations are sent
/// to the table in the background and never touch the copy; it is replaced
/// wholesale whenever a change notification for the current user arrives.
///
/// Cloning is cheap and all clones share the same copy.
#[derive(Clone)]
pub struct RemoteWishlist {
    inner: Arc<RemoteInner>,
}

struct RemoteInner {
    table: Arc<dyn WishlistTable>,
    sessions: Arc<dyn SessionProvider>,
    store: Mutex<WishlistStore>,
    auth_path: String,
    subscription: Mutex<Option<JoinHandle<()>>>,
    revision: watch::Sender<u64>,
    /// Number of reloads started. Only the latest may replace the copy.
    reloads: AtomicU64,
}

impl RemoteWishlist {
    /// Create an adapter. Call [`start`](Self::start) to load and subscribe.
    pub fn new(
        table: Arc<dyn WishlistTable>,
        sessions: Arc<dyn SessionProvider>,
        auth_path: impl Into<String>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(RemoteInner {
                table,
                sessions,
                store: Mutex::new(WishlistStore::new()),
                auth_path: auth_path.into(),
                subscription: Mutex::new(None),
                revision,
                reloads: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to change notifications and load the current user's rows.
    ///
    /// Subscribing happens before the initial load so no change between the
    /// two is missed. Calling this again replaces the previous subscription.
    pub async fn start(&self) {
        let events = self.inner.table.subscribe();
        self.inner.reload().await;

        let handle = tokio::spawn(listen(Arc::downgrade(&self.inner), events));
        let previous = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        info!("Remote wishlist subscribed");
    }

    /// Stop listening for change notifications.
    pub fn stop(&self) {
        self.inner.abort_subscription();
    }

    /// Refetch the current user's rows, or clear the copy when signed out.
    pub async fn reload(&self) {
        self.inner.reload().await;
    }

    /// Add `entry` to the signed-in user's wishlist.
    #[instrument(skip(self, entry), fields(product_id = %entry.product_id()))]
    pub async fn add(&self, entry: WishlistEntry) -> SyncOutcome {
        let Some(session) = self.inner.sessions.current_session().await else {
            return self.auth_required();
        };
        let user = session.user_id();
        let table = Arc::clone(&self.inner.table);
        tokio::spawn(async move {
            if let Err(e) = table.insert(user, &entry).await {
                error!(error = %e, product_id = %entry.product_id(), "Failed to add wishlist entry");
            }
        });
        SyncOutcome::Dispatched
    }

    /// Remove `product_id` from the signed-in user's wishlist.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> SyncOutcome {
        let Some(session) = self.inner.sessions.current_session().await else {
            return self.auth_required();
        };
        let user = session.user_id();
        let table = Arc::clone(&self.inner.table);
        tokio::spawn(async move {
            if let Err(e) = table.delete(user, &product_id).await {
                error!(error = %e, %product_id, "Failed to remove wishlist entry");
            }
        });
        SyncOutcome::Dispatched
    }

    /// Remove every entry of the signed-in user.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> SyncOutcome {
        let Some(session) = self.inner.sessions.current_session().await else {
            return self.auth_required();
        };
        let user = session.user_id();
        let table = Arc::clone(&self.inner.table);
        tokio::spawn(async move {
            if let Err(e) = table.delete_all(user).await {
                error!(error = %e, "Failed to clear wishlist");
            }
        });
        SyncOutcome::Dispatched
    }

    /// Entries as of the last reload.
    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.inner.lock_store().entries().to_vec()
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.inner.lock_store().contains(product_id)
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<WishlistEntry> {
        self.inner.lock_store().get(product_id).cloned()
    }

    /// Watch the reload counter. It increments after every reload.
    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn auth_required(&self) -> SyncOutcome {
        debug!(redirect_to = %self.inner.auth_path, "Wishlist mutation requires sign-in");
        SyncOutcome::AuthRequired {
            redirect_to: self.inner.auth_path.clone(),
        }
    }
}

impl std::fmt::Debug for RemoteWishlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteWishlist")
            .field("auth_path", &self.inner.auth_path)
            .finish_non_exhaustive()
    }
}

impl RemoteInner {
    fn lock_store(&self) -> std::sync::MutexGuard<'_, WishlistStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reloads may overlap (listener task and sign-in handlers). A reload
    /// that finishes after a newer one has started is discarded, so rows
    /// fetched for a previous session never replace the current ones.
    async fn reload(&self) {
        let ticket = self.reloads.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(session) = self.sessions.current_session().await else {
            self.replace(ticket, Vec::new());
            return;
        };
        match self.table.select_all(session.user_id()).await {
            Ok(entries) => {
                let count = entries.len();
                if self.replace(ticket, entries) {
                    debug!(user_id = %session.user_id(), count, "Wishlist reloaded");
                }
            }
            Err(e) => error!(error = %e, user_id = %session.user_id(), "Failed to reload wishlist"),
        }
    }

    fn replace(&self, ticket: u64, entries: Vec<WishlistEntry>) -> bool {
        let mut store = self.lock_store();
        if self.reloads.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded wishlist reload");
            return false;
        }
        store.replace(entries);
        drop(store);
        self.revision.send_modify(|revision| *revision += 1);
        true
    }

    fn abort_subscription(&self) {
        if let Some(handle) = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    async fn concerns_current_user(&self, event: &ChangeEvent) -> bool {
        self.sessions
            .current_session()
            .await
            .is_some_and(|session| session.user_id() == event.user_id)
    }
}

impl Drop for RemoteInner {
    fn drop(&mut self) {
        self.abort_subscription();
    }
}

async fn listen(inner: Weak<RemoteInner>, mut events: broadcast::Receiver<ChangeEvent>) {
    loop {
        let reload = match events.recv().await {
            Ok(event) => {
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                inner.concerns_current_user(&event).await
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed wishlist notifications, reloading");
                true
            }
            Err(RecvError::Closed) => {
                debug!("Wishlist notification channel closed");
                return;
            }
        };

        if reload {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.reload().await;
        }
    }
}
