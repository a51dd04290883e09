//! Keycraft storefront state library.
//!
//! Cart and wishlist stores, their persistence and remote synchronization,
//! and the JSON API that exposes them. The binary in `main.rs` wires these
//! together; tests drive [`app`] in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collections;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router.
///
/// Every request runs inside the state's store context scope.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::provide_store_context,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
