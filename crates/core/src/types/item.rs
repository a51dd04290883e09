//! Cart lines and wishlist entries.
//!
//! Field names on the wire follow the storefront's legacy camelCase
//! snapshot format (`id`, `price`, `switchType`, `cartItemId`, ...), so older
//! snapshots keep loading.

use serde::{Deserialize, Serialize};

use super::id::{LineId, ProductId};
use super::price::Price;
use super::variant::VariantAttributes;

/// Product details copied into a line at add-time.
///
/// These are not live-joined to the catalog: a later price change does not
/// alter what is already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub variant: VariantAttributes,
}

impl ItemDetails {
    /// Create item details with no category and no variant attributes.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Price,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            image: String::new(),
            category: None,
            variant: VariantAttributes::default(),
        }
    }

    /// Set the variant attributes.
    #[must_use]
    pub fn with_variant(mut self, variant: VariantAttributes) -> Self {
        self.variant = variant;
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns `true` if `other` describes the same cart line identity:
    /// same product and exactly the same variant attributes.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.product_id == other.product_id && self.variant == other.variant
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "cartItemId")]
    pub line_id: LineId,
    #[serde(flatten)]
    pub item: ItemDetails,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Total for this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.unit_price.times(self.quantity)
    }

    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.item.product_id
    }
}

/// An entry in the wishlist. Identity is the product alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    #[serde(flatten)]
    pub item: ItemDetails,
}

impl WishlistEntry {
    /// The product this entry refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.item.product_id
    }
}

impl From<ItemDetails> for WishlistEntry {
    fn from(item: ItemDetails) -> Self {
        Self { item }
    }
}
