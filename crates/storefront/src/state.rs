//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::StorefrontConfig;
use crate::context::{ContextError, StoreContext};
use crate::db;
use crate::persistence::{FileStore, Storage};
use crate::services::auth::{AuthError, LocalSessionProvider};
use crate::sync::{PgWishlistTable, RemoteError, RemoteWishlist};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("session provider: {0}")]
    Auth(#[from] AuthError),
    #[error("store context: {0}")]
    Context(#[from] ContextError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("remote wishlist: {0}")]
    Remote(#[from] RemoteError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store context, the session provider, and the database pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    context: StoreContext,
    sessions: Arc<LocalSessionProvider>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state from already-mounted parts.
    #[must_use]
    pub fn new(
        context: StoreContext,
        sessions: Arc<LocalSessionProvider>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                context,
                sessions,
                pool,
            }),
        }
    }

    /// Mount everything described by `config`.
    ///
    /// Snapshots live in `config.data_dir`. With a database URL the wishlist
    /// is the remote variant; otherwise it is persisted locally.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a provider cannot be mounted or the database
    /// is unreachable.
    pub async fn build(config: &StorefrontConfig) -> Result<Self, StateError> {
        let storage = Storage::new(FileStore::new(&config.data_dir));
        let sessions = Arc::new(LocalSessionProvider::mount(storage.clone()).await?);

        let (context, pool) = if let Some(database_url) = &config.database_url {
            let pool = db::create_pool(database_url).await?;
            info!("Database pool created");

            let table = PgWishlistTable::connect(pool.clone()).await?;
            let remote = RemoteWishlist::new(
                Arc::new(table),
                sessions.clone(),
                config.auth_path.clone(),
            );
            let context =
                StoreContext::mount_remote(&storage, config.persist_debounce, remote).await?;
            (context, Some(pool))
        } else {
            info!("No database configured, wishlist is stored locally");
            let context = StoreContext::mount_local(&storage, config.persist_debounce).await?;
            (context, None)
        };

        info!(data_dir = %config.data_dir.display(), "Store context mounted");
        Ok(Self::new(context, sessions, pool))
    }

    /// Get a reference to the root store context.
    #[must_use]
    pub fn context(&self) -> &StoreContext {
        &self.inner.context
    }

    /// Get a reference to the session provider.
    #[must_use]
    pub fn sessions(&self) -> &LocalSessionProvider {
        &self.inner.sessions
    }

    /// Get a reference to the database connection pool, if configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
