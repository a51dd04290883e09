//! Cart route handlers.
//!
//! The cart lives in the ambient store context installed by
//! [`provide_store_context`](crate::middleware::provide_store_context).
//! Every mutation answers with the updated cart view.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use keycraft_core::{CartLine, ItemDetails, LineId};

use crate::context::{CartProvider, use_cart};
use crate::error::add_breadcrumb;

/// Cart line display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub cart_item_id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

/// Cart count badge data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCountView {
    pub item_count: u32,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            cart_item_id: line.line_id.to_string(),
            product_id: line.item.product_id.to_string(),
            name: line.item.name.clone(),
            image: line.item.image.clone(),
            category: line.item.category.clone(),
            switch_type: line.item.variant.switch_type.clone(),
            layout: line.item.variant.layout.clone(),
            quantity: line.quantity,
            price: line.item.unit_price.to_string(),
            line_price: line.line_total().to_string(),
        }
    }
}

impl From<&CartProvider> for CartView {
    fn from(cart: &CartProvider) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart request body.
///
/// Item fields use the stored snapshot names (`id`, `name`, `price`, ...).
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(flatten)]
    pub item: ItemDetails,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Line id to use if a new line is created.
    #[serde(default, rename = "cartItemId")]
    pub line_id: Option<LineId>,
}

const fn default_quantity() -> u32 {
    1
}

/// Update quantity request body. `id` is a line id or a product id.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub id: String,
    pub quantity: i64,
}

/// Remove request body. `id` is a line id or a product id.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub id: String,
}

/// Display the cart.
#[instrument]
pub async fn show() -> Json<CartView> {
    Json(CartView::from(&*use_cart()))
}

/// Cart count badge.
#[instrument]
pub async fn count() -> Json<CartCountView> {
    Json(CartCountView {
        item_count: use_cart().item_count(),
    })
}

/// Add an item, merging with an identical line.
#[instrument(skip(request), fields(product_id = %request.item.product_id))]
pub async fn add(Json(request): Json<AddToCartRequest>) -> Json<CartView> {
    let cart = use_cart();
    let product_id = request.item.product_id.to_string();
    let line_id = cart.add_with_line_id(request.item, request.quantity, request.line_id);

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", product_id.as_str()),
            ("cart_item_id", line_id.as_str()),
        ]),
    );
    Json(CartView::from(&*cart))
}

/// Set a line's quantity; a quantity below 1 removes the line.
#[instrument]
pub async fn update(Json(request): Json<UpdateCartRequest>) -> Json<CartView> {
    let cart = use_cart();
    if !cart.update_quantity(&request.id, request.quantity) {
        tracing::debug!(id = %request.id, "No cart line to update");
    }
    Json(CartView::from(&*cart))
}

/// Remove a line by line id, or every line of a product.
#[instrument]
pub async fn remove(Json(request): Json<RemoveFromCartRequest>) -> Json<CartView> {
    let cart = use_cart();
    if cart.remove(&request.id) {
        add_breadcrumb("cart", "Removed from cart", Some(&[("id", request.id.as_str())]));
    }
    Json(CartView::from(&*cart))
}

/// Empty the cart.
#[instrument]
pub async fn clear() -> Json<CartView> {
    let cart = use_cart();
    cart.clear();
    add_breadcrumb("cart", "Cleared cart", None);
    Json(CartView::from(&*cart))
}
