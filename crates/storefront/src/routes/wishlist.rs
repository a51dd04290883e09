//! Wishlist route handlers.
//!
//! With the local wishlist, mutations apply immediately and answer with the
//! updated wishlist. With the remote wishlist they answer `202 Accepted`
//! once dispatched (the change shows up after the next reload), or redirect
//! to the sign-in entry point when nobody is signed in.

use axum::{
    Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use keycraft_core::{LineId, ProductId, WishlistEntry};

use crate::context::{StoreContext, WishlistHandle, use_cart, use_wishlist};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::sync::SyncOutcome;

/// Wishlist display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistView {
    pub items: Vec<WishlistEntry>,
    pub count: usize,
}

impl From<&WishlistHandle> for WishlistView {
    fn from(wishlist: &WishlistHandle) -> Self {
        let items = wishlist.entries();
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Membership check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainsView {
    pub product_id: ProductId,
    pub contains: bool,
}

/// Result of moving a wishlist entry into the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToCartView {
    pub cart_item_id: LineId,
    pub item_count: u32,
}

/// Acknowledgement for a dispatched remote mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchedView {
    pub status: String,
}

/// Product reference request body.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub id: ProductId,
}

fn outcome_response(outcome: SyncOutcome, wishlist: &WishlistHandle) -> Response {
    match outcome {
        SyncOutcome::Applied => Json(WishlistView::from(wishlist)).into_response(),
        SyncOutcome::Dispatched => (
            StatusCode::ACCEPTED,
            Json(DispatchedView {
                status: "dispatched".to_string(),
            }),
        )
            .into_response(),
        SyncOutcome::AuthRequired { redirect_to } => Redirect::to(&redirect_to).into_response(),
    }
}

/// Display the wishlist.
#[instrument]
pub async fn show() -> Json<WishlistView> {
    Json(WishlistView::from(&*use_wishlist()))
}

/// Check whether a product is in the wishlist.
#[instrument]
pub async fn contains(Path(product_id): Path<String>) -> Json<ContainsView> {
    let product_id = ProductId::from(product_id);
    let contains = use_wishlist().contains(&product_id);
    Json(ContainsView {
        product_id,
        contains,
    })
}

/// Add an entry. Adding a product already present changes nothing.
#[instrument(skip(entry), fields(product_id = %entry.product_id()))]
pub async fn add(Json(entry): Json<WishlistEntry>) -> Response {
    let wishlist = use_wishlist();
    let product_id = entry.product_id().to_string();
    let outcome = wishlist.add(entry).await;
    if !matches!(outcome, SyncOutcome::AuthRequired { .. }) {
        add_breadcrumb(
            "wishlist",
            "Added to wishlist",
            Some(&[("product_id", product_id.as_str())]),
        );
    }
    outcome_response(outcome, &wishlist)
}

/// Remove an entry.
#[instrument]
pub async fn remove(Json(request): Json<ProductRequest>) -> Response {
    let wishlist = use_wishlist();
    let outcome = wishlist.remove(request.id).await;
    outcome_response(outcome, &wishlist)
}

/// Remove every entry.
#[instrument]
pub async fn clear() -> Response {
    let wishlist = use_wishlist();
    let outcome = wishlist.clear().await;
    outcome_response(outcome, &wishlist)
}

/// Add a wishlist entry to the cart with quantity 1.
///
/// The wishlist itself is left unchanged.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product is not in the wishlist.
#[instrument]
pub async fn move_to_cart(Json(request): Json<ProductRequest>) -> Result<Json<MoveToCartView>> {
    let context = StoreContext::try_current()?;
    let cart_item_id = context
        .move_to_cart(&request.id)
        .ok_or_else(|| AppError::NotFound(format!("wishlist entry {}", request.id)))?;

    add_breadcrumb(
        "wishlist",
        "Moved to cart",
        Some(&[("product_id", request.id.as_str())]),
    );
    Ok(Json(MoveToCartView {
        cart_item_id,
        item_count: use_cart().item_count(),
    }))
}
