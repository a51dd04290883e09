//! Domain models for storefront.

pub mod session;

pub use session::{Session, storage_keys};
