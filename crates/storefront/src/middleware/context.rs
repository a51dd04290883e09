//! Store context middleware.
//!
//! Installs the application's root [`StoreContext`](crate::context::StoreContext)
//! as the ambient context of each request, so handlers reach the cart and
//! wishlist through [`use_cart`](crate::context::use_cart) and
//! [`use_wishlist`](crate::context::use_wishlist).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Run the rest of the request inside the store context scope.
///
/// # Errors
///
/// Returns `AppError::Context` if a scope is already installed on the
/// serving task.
pub async fn provide_store_context(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = state.context().clone();
    Ok(context.scope(next.run(request)).await?)
}
