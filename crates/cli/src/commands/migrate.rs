//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! kc-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `KEYCRAFT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection
//!   string for the remote wishlist
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/`

use keycraft_storefront::config::{ConfigError, StorefrontConfig};
use keycraft_storefront::db;

/// Errors from running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No database configured: set KEYCRAFT_DATABASE_URL or DATABASE_URL")]
    NoDatabase,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if no database is configured, the connection
/// fails, or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let config = StorefrontConfig::from_env()?;
    let database_url = config.database_url.ok_or(MigrationError::NoDatabase)?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
