//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Store context (install the root cart/wishlist context for the request)

pub mod context;

pub use context::provide_store_context;
