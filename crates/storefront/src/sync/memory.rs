//! In-memory wishlist table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use keycraft_core::{ProductId, UserId, WishlistEntry};

use super::{ChangeEvent, ChangeOp, RemoteError, WishlistTable};

/// Wishlist table held in memory, with notifications over a broadcast channel.
///
/// Like the database trigger, a notification is sent only when rows actually
/// change.
#[derive(Debug)]
pub struct MemoryWishlistTable {
    rows: Mutex<HashMap<UserId, Vec<WishlistEntry>>>,
    events: broadcast::Sender<ChangeEvent>,
    failing: AtomicBool,
    mutations: AtomicUsize,
}

impl Default for MemoryWishlistTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWishlistTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            rows: Mutex::new(HashMap::new()),
            events,
            failing: AtomicBool::new(false),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call fail with `RemoteError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of mutating calls received (successful or not).
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Rows of `user` without going through the async interface.
    #[must_use]
    pub fn rows_for(&self, user: UserId) -> Vec<WishlistEntry> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("table marked failing".to_string()));
        }
        Ok(())
    }

    fn notify(&self, op: ChangeOp, user_id: UserId) {
        // No subscribers is fine.
        let _ = self.events.send(ChangeEvent { op, user_id });
    }
}

#[async_trait]
impl WishlistTable for MemoryWishlistTable {
    async fn insert(&self, user: UserId, entry: &WishlistEntry) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let inserted = {
            let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
            let entries = rows.entry(user).or_default();
            if entries.iter().any(|e| e.product_id() == entry.product_id()) {
                false
            } else {
                entries.push(entry.clone());
                true
            }
        };
        if inserted {
            self.notify(ChangeOp::Insert, user);
        }
        Ok(())
    }

    async fn delete(&self, user: UserId, product_id: &ProductId) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let deleted = {
            let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
            rows.get_mut(&user).is_some_and(|entries| {
                let before = entries.len();
                entries.retain(|e| e.product_id() != product_id);
                entries.len() != before
            })
        };
        if deleted {
            self.notify(ChangeOp::Delete, user);
        }
        Ok(())
    }

    async fn delete_all(&self, user: UserId) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let deleted = self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user)
            .is_some_and(|entries| !entries.is_empty());
        if deleted {
            self.notify(ChangeOp::Delete, user);
        }
        Ok(())
    }

    async fn select_all(&self, user: UserId) -> Result<Vec<WishlistEntry>, RemoteError> {
        self.check()?;
        Ok(self.rows_for(user))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
