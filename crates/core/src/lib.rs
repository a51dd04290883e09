//! Keycraft Core - Shared types library.
//!
//! This crate provides the types shared by all Keycraft components:
//! - `storefront` - Cart/wishlist state, persistence, and the JSON API
//! - `cli` - Command-line tools for migrations and snapshot inspection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, prices, emails, variant attributes, and line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
