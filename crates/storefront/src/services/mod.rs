//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Session provider (simulated sign-in backed by storage)

pub mod auth;
