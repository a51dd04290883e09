//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database, when configured)
//!
//! # Cart
//! GET  /cart                    - Cart view (lines, subtotal, item count)
//! GET  /cart/count              - Item count badge
//! POST /cart/add                - Add item (merges with an identical line)
//! POST /cart/update             - Set quantity by line id or product id
//! POST /cart/remove             - Remove by line id or product id
//! POST /cart/clear              - Empty the cart
//!
//! # Wishlist
//! GET  /wishlist                - Wishlist view
//! GET  /wishlist/contains/{id}  - Membership check
//! POST /wishlist/add            - Add entry
//! POST /wishlist/remove         - Remove entry
//! POST /wishlist/clear          - Remove every entry
//! POST /wishlist/move-to-cart   - Add a wishlist entry to the cart
//!
//! # Auth
//! GET  /auth                    - Sign-in entry point (session status)
//! POST /auth/login              - Simulated sign-in
//! POST /auth/logout             - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/contains/{id}", get(wishlist::contains))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/clear", post(wishlist::clear))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::status))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when the remote wishlist is configured.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
