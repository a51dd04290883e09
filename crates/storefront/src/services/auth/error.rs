//! Authentication error types.

use thiserror::Error;

use crate::persistence::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] keycraft_core::EmailError),

    /// Empty or rejected credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another session provider already owns the `user` key on this medium.
    #[error("session provider already mounted")]
    AlreadyMounted,
}
