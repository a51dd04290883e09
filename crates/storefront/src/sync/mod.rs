//! Remote wishlist synchronization.
//!
//! # Architecture
//!
//! - [`WishlistTable`] is the remote row store scoped by user, plus a
//!   change-notification subscription. Implementations: [`PgWishlistTable`]
//!   (`LISTEN`/`NOTIFY`) and [`MemoryWishlistTable`].
//! - [`RemoteWishlist`] mirrors the signed-in user's rows in memory. It never
//!   applies a mutation locally: writes are dispatched to the table, and the
//!   in-memory copy changes only when a change notification triggers a full
//!   reload.

mod adapter;
mod memory;
mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use keycraft_core::{ProductId, UserId, WishlistEntry};

pub use adapter::RemoteWishlist;
pub use memory::MemoryWishlistTable;
pub use postgres::{CHANGE_CHANNEL, PgWishlistTable};

/// Errors from the remote table.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The table is not reachable.
    #[error("remote table unavailable: {0}")]
    Unavailable(String),
}

/// Row operation reported by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A change to some user's wishlist rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub op: ChangeOp,
    pub user_id: UserId,
}

/// Remote wishlist rows, scoped by user.
#[async_trait]
pub trait WishlistTable: Send + Sync {
    /// Insert an entry. Inserting a product already present is a no-op.
    async fn insert(&self, user: UserId, entry: &WishlistEntry) -> Result<(), RemoteError>;

    /// Delete the entry for `product_id`.
    async fn delete(&self, user: UserId, product_id: &ProductId) -> Result<(), RemoteError>;

    /// Delete every entry of `user`.
    async fn delete_all(&self, user: UserId) -> Result<(), RemoteError>;

    /// All entries of `user`, oldest first.
    async fn select_all(&self, user: UserId) -> Result<Vec<WishlistEntry>, RemoteError>;

    /// Subscribe to change notifications for all users.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Result of a wishlist mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Applied to the local store.
    Applied,
    /// Sent to the remote table; visible after the next reload.
    Dispatched,
    /// No session: the caller should send the user to `redirect_to`.
    AuthRequired { redirect_to: String },
}
