//! Core types for Keycraft.
//!
//! This module provides type-safe wrappers for the cart and wishlist domain.

pub mod email;
pub mod id;
pub mod item;
pub mod kind;
pub mod price;
pub mod variant;

pub use email::{Email, EmailError};
pub use id::*;
pub use item::{CartLine, ItemDetails, WishlistEntry};
pub use kind::CollectionKind;
pub use price::{Price, PriceError};
pub use variant::VariantAttributes;
