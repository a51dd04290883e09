//! Authentication session provider.
//!
//! The cart/wishlist core only needs "who is signed in right now"; that is
//! the [`SessionProvider`] contract. [`LocalSessionProvider`] is the
//! storefront's simulated sign-in: it accepts the demo admin account and any
//! other non-empty email/password pair, and keeps the session under the
//! `user` storage key. It performs no real credential check.

mod error;

pub use error::AuthError;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use keycraft_core::Email;

use crate::models::{Session, storage_keys};
use crate::persistence::{KeyClaim, Storage, StorageError};

/// Demo back-office account.
const DEMO_ADMIN_EMAIL: &str = "admin@example.com";
const DEMO_ADMIN_PASSWORD: &str = "admin123";

/// Source of the current authenticated session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, if any.
    async fn current_session(&self) -> Option<Session>;
}

/// Session provider persisting the signed-in user to a storage medium.
pub struct LocalSessionProvider {
    storage: Storage,
    current: Mutex<Option<Session>>,
    _claim: KeyClaim,
}

impl LocalSessionProvider {
    /// Mount the provider, restoring any stored session.
    ///
    /// A malformed stored session is deleted and treated as signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyMounted` if another provider owns the
    /// `user` key on this storage medium.
    pub async fn mount(storage: Storage) -> Result<Self, AuthError> {
        let claim = storage
            .claim(storage_keys::USER)
            .ok_or(AuthError::AlreadyMounted)?;

        let session = match storage.get(storage_keys::USER).await {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed stored session");
                    if let Err(e) = storage.delete(storage_keys::USER).await {
                        warn!(error = %e, "Failed to delete malformed session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        };

        Ok(Self {
            storage,
            current: Mutex::new(session),
            _claim: claim,
        })
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email or password is
    /// empty, `AuthError::InvalidEmail` if the email is malformed, or
    /// `AuthError::Storage` if the session cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = Email::parse(email)?;
        let is_admin = email.as_str() == DEMO_ADMIN_EMAIL && password == DEMO_ADMIN_PASSWORD;

        let session = Session { email, is_admin };
        let raw = serde_json::to_string(&session).map_err(StorageError::from)?;
        self.storage.set(storage_keys::USER, raw).await?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());

        info!(user_id = %session.user_id(), is_admin, "User signed in");
        Ok(session)
    }

    /// Sign out. Signing out while signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored session cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.storage.delete(storage_keys::USER).await?;
        if let Some(session) = previous {
            info!(user_id = %session.user_id(), "User signed out");
        }
        Ok(())
    }

    /// The signed-in user, without going through the trait object.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionProvider for LocalSessionProvider {
    async fn current_session(&self) -> Option<Session> {
        self.session()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::persistence::MemoryStore;

    #[tokio::test]
    async fn test_demo_admin_login() {
        let sessions = LocalSessionProvider::mount(Storage::memory()).await.unwrap();
        let session = sessions.login("admin@example.com", "admin123").await.unwrap();
        assert!(session.is_admin);
    }

    #[tokio::test]
    async fn test_any_non_empty_login_is_customer() {
        let sessions = LocalSessionProvider::mount(Storage::memory()).await.unwrap();
        let session = sessions.login("shopper@example.com", "hunter2").await.unwrap();
        assert!(!session.is_admin);
        assert_eq!(sessions.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let sessions = LocalSessionProvider::mount(Storage::memory()).await.unwrap();
        assert!(matches!(
            sessions.login("", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login("a@b.c", "").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login("not-an-email", "pw").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_session_survives_remount_until_logout() {
        let medium = Arc::new(MemoryStore::new());
        let storage = Storage::from_arc(medium.clone());

        let sessions = LocalSessionProvider::mount(storage.clone()).await.unwrap();
        sessions.login("shopper@example.com", "pw").await.unwrap();
        drop(sessions);

        let sessions = LocalSessionProvider::mount(storage.clone()).await.unwrap();
        assert!(sessions.session().is_some());

        sessions.logout().await.unwrap();
        assert!(sessions.session().is_none());
        assert_eq!(medium.peek("user"), None);
    }

    #[tokio::test]
    async fn test_malformed_session_discarded() {
        let medium = Arc::new(MemoryStore::new());
        medium.seed("user", "{\"email\":42}");
        let sessions = LocalSessionProvider::mount(Storage::from_arc(medium.clone()))
            .await
            .unwrap();
        assert!(sessions.session().is_none());
        assert_eq!(medium.peek("user"), None);
    }

    #[tokio::test]
    async fn test_second_mount_rejected() {
        let storage = Storage::memory();
        let _first = LocalSessionProvider::mount(storage.clone()).await.unwrap();
        assert!(matches!(
            LocalSessionProvider::mount(storage).await,
            Err(AuthError::AlreadyMounted)
        ));
    }
}
