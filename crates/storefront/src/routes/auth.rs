//! Authentication route handlers.
//!
//! Simulated sign-in backed by [`LocalSessionProvider`](crate::services::auth::LocalSessionProvider).
//! After every sign-in or sign-out the remote wishlist, if any, is reloaded
//! for the new identity.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::models::Session;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Session status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl From<Option<&Session>> for SessionView {
    fn from(session: Option<&Session>) -> Self {
        session.map_or(
            Self {
                signed_in: false,
                email: None,
                user_id: None,
                is_admin: false,
            },
            |session| Self {
                signed_in: true,
                email: Some(session.email.to_string()),
                user_id: Some(session.user_id().to_string()),
                is_admin: session.is_admin,
            },
        )
    }
}

/// Sign-in entry point: current session status.
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<SessionView> {
    Json(SessionView::from(state.sessions().session().as_ref()))
}

/// Sign in.
///
/// # Errors
///
/// Returns `AppError::Auth` for empty credentials, a malformed email, or a
/// session that cannot be persisted.
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionView>> {
    let session = state
        .sessions()
        .login(&request.email, &request.password)
        .await?;
    set_sentry_user(&session.user_id(), Some(session.email.as_str()));

    if let Some(remote) = state.context().wishlist().remote() {
        remote.reload().await;
    }
    Ok(Json(SessionView::from(Some(&session))))
}

/// Sign out.
///
/// # Errors
///
/// Returns `AppError::Auth` if the stored session cannot be removed.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionView>> {
    state.sessions().logout().await?;
    clear_sentry_user();

    if let Some(remote) = state.context().wishlist().remote() {
        remote.reload().await;
    }
    Ok(Json(SessionView::from(None)))
}
