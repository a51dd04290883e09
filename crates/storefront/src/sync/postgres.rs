//! `PostgreSQL` wishlist table.
//!
//! Rows live in `storefront.wishlist_item`. A row trigger publishes
//! `{"op": ..., "user_id": ...}` on the `wishlist_changes` channel; a
//! background task forwards those notifications to subscribers.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use keycraft_core::{ItemDetails, Price, ProductId, UserId, VariantAttributes, WishlistEntry};

use super::{ChangeEvent, RemoteError, WishlistTable};

/// `NOTIFY` channel used by the wishlist trigger.
pub const CHANGE_CHANNEL: &str = "wishlist_changes";

/// Pause before retrying after a listener error.
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    product_id: String,
    name: String,
    price: Decimal,
    image: String,
    category: Option<String>,
    switch_type: Option<String>,
    layout: Option<String>,
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        Self {
            item: ItemDetails {
                product_id: ProductId::from(row.product_id),
                name: row.name,
                unit_price: Price::new(row.price),
                image: row.image,
                category: row.category,
                variant: VariantAttributes {
                    switch_type: row.switch_type,
                    layout: row.layout,
                },
            },
        }
    }
}

/// Wishlist table backed by `PostgreSQL`.
pub struct PgWishlistTable {
    pool: PgPool,
    events: broadcast::Sender<ChangeEvent>,
    listener: JoinHandle<()>,
}

impl PgWishlistTable {
    /// Connect a notification listener and start forwarding changes.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Database` if the listener cannot connect or
    /// subscribe to the channel.
    pub async fn connect(pool: PgPool) -> Result<Self, RemoteError> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (events, _) = broadcast::channel(64);
        let listener = tokio::spawn(forward_notifications(listener, events.clone()));
        info!(channel = CHANGE_CHANNEL, "Listening for wishlist changes");

        Ok(Self {
            pool,
            events,
            listener,
        })
    }
}

impl Drop for PgWishlistTable {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn forward_notifications(mut listener: PgListener, events: broadcast::Sender<ChangeEvent>) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                    Ok(event) => {
                        debug!(op = ?event.op, user_id = %event.user_id, "Wishlist change notification");
                        let _ = events.send(event);
                    }
                    Err(e) => {
                        warn!(error = %e, payload = notification.payload(), "Ignoring malformed wishlist notification");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Wishlist notification listener failed");
                tokio::time::sleep(LISTENER_RETRY_DELAY).await;
            }
        }
    }
}

#[async_trait]
impl WishlistTable for PgWishlistTable {
    #[instrument(skip(self, entry), fields(product_id = %entry.product_id()))]
    async fn insert(&self, user: UserId, entry: &WishlistEntry) -> Result<(), RemoteError> {
        let item = &entry.item;
        sqlx::query(
            r"
            INSERT INTO storefront.wishlist_item
                (user_id, product_id, name, price, image, category, switch_type, layout)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user.as_uuid())
        .bind(item.product_id.as_str())
        .bind(&item.name)
        .bind(item.unit_price.amount())
        .bind(&item.image)
        .bind(item.category.as_deref())
        .bind(item.variant.switch_type.as_deref())
        .bind(item.variant.layout.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, user: UserId, product_id: &ProductId) -> Result<(), RemoteError> {
        sqlx::query(
            r"
            DELETE FROM storefront.wishlist_item
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user.as_uuid())
        .bind(product_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, user: UserId) -> Result<(), RemoteError> {
        sqlx::query("DELETE FROM storefront.wishlist_item WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn select_all(&self, user: UserId) -> Result<Vec<WishlistEntry>, RemoteError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT product_id, name, price, image, category, switch_type, layout
            FROM storefront.wishlist_item
            WHERE user_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WishlistEntry::from).collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
