//! Integration tests for Keycraft.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p keycraft-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - store + snapshot + rehydration scenarios
//! - `context_scope` - ambient context and single-provider rules
//! - `http_api` - JSON API driven in-process with `tower::ServiceExt`
//! - `remote_sync` - remote wishlist against the in-memory table
//!
//! Everything runs in-process against in-memory or temporary-directory
//! storage; no database or network is needed.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use keycraft_storefront::config::StorefrontConfig;
use keycraft_storefront::context::StoreContext;
use keycraft_storefront::persistence::{MemoryStore, Storage};
use keycraft_storefront::services::auth::LocalSessionProvider;
use keycraft_storefront::state::AppState;
use keycraft_storefront::sync::{MemoryWishlistTable, RemoteWishlist};

/// Debounce window used by test contexts.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuration with every variable at its default.
///
/// # Panics
///
/// Panics if the defaults fail to validate.
#[must_use]
pub fn default_config() -> StorefrontConfig {
    StorefrontConfig::from_lookup(|_| None).expect("default configuration is valid")
}

/// A storefront wired to in-memory storage.
pub struct TestApp {
    pub state: AppState,
    pub medium: Arc<MemoryStore>,
    pub table: Option<Arc<MemoryWishlistTable>>,
}

/// A response with its body decoded as JSON (or `Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Storefront with the local wishlist.
    ///
    /// # Panics
    ///
    /// Panics if a provider fails to mount.
    pub async fn local() -> Self {
        let medium = Arc::new(MemoryStore::new());
        let storage = Storage::from_arc(medium.clone());
        let sessions = Arc::new(
            LocalSessionProvider::mount(storage.clone())
                .await
                .expect("mount sessions"),
        );
        let context = StoreContext::mount_local(&storage, DEBOUNCE)
            .await
            .expect("mount context");

        Self {
            state: AppState::new(context, sessions, None),
            medium,
            table: None,
        }
    }

    /// Storefront with the remote wishlist backed by an in-memory table.
    ///
    /// # Panics
    ///
    /// Panics if a provider fails to mount.
    pub async fn remote() -> Self {
        let medium = Arc::new(MemoryStore::new());
        let storage = Storage::from_arc(medium.clone());
        let sessions = Arc::new(
            LocalSessionProvider::mount(storage.clone())
                .await
                .expect("mount sessions"),
        );
        let table = Arc::new(MemoryWishlistTable::new());
        let config = default_config();
        let remote = RemoteWishlist::new(table.clone(), sessions.clone(), config.auth_path);
        let context = StoreContext::mount_remote(&storage, DEBOUNCE, remote)
            .await
            .expect("mount context");

        Self {
            state: AppState::new(context, sessions, None),
            medium,
            table: Some(table),
        }
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> Router {
        keycraft_storefront::app(self.state.clone())
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Send a request through a fresh router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Write out pending snapshots.
    pub async fn flush(&self) {
        self.state.context().flush().await;
    }
}

/// JSON body for a product.
#[must_use]
pub fn product_json(id: &str, name: &str, price: &str) -> Value {
    serde_json::json!({ "id": id, "name": name, "price": price, "image": format!("/img/{id}.png") })
}
