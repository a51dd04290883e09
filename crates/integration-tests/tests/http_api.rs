//! Integration tests for the JSON API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use keycraft_integration_tests::{TestApp, product_json};
use serde_json::json;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::local().await;
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let app = TestApp::local().await;
    let response = app.get("/health/ready").await;
    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_merges_and_reports_subtotal() {
    let app = TestApp::local().await;

    let mut body = product_json("P1", "Keycraft 65", "10.00");
    body["quantity"] = json!(1);
    app.post("/cart/add", body.clone()).await;
    body["quantity"] = json!(2);
    let response = app.post("/cart/add", body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["items"][0]["quantity"], 3);
    assert_eq!(response.body["subtotal"], "$30.00");
    assert_eq!(response.body["itemCount"], 3);

    let count = app.get("/cart/count").await;
    assert_eq!(count.body["itemCount"], 3);
}

#[tokio::test]
async fn test_add_without_quantity_defaults_to_one() {
    let app = TestApp::local().await;
    let response = app
        .post("/cart/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;
    assert_eq!(response.body["itemCount"], 1);

    let mut zero = product_json("P2", "Keycaps", "45.00");
    zero["quantity"] = json!(0);
    let response = app.post("/cart/add", zero).await;
    assert_eq!(response.body["itemCount"], 2);
}

#[tokio::test]
async fn test_variants_get_separate_lines() {
    let app = TestApp::local().await;

    let mut brown = product_json("P1", "Keycraft 65", "10.00");
    brown["switchType"] = json!("brown");
    let mut red = brown.clone();
    red["switchType"] = json!("red");

    app.post("/cart/add", brown).await;
    let response = app.post("/cart/add", red).await;
    let items = response.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_ne!(items[0]["cartItemId"], items[1]["cartItemId"]);
}

#[tokio::test]
async fn test_update_and_remove_by_line_or_product() {
    let app = TestApp::local().await;
    let added = app
        .post("/cart/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;
    let line_id = added.body["items"][0]["cartItemId"].as_str().unwrap().to_string();

    let updated = app
        .post("/cart/update", json!({ "id": line_id, "quantity": 4 }))
        .await;
    assert_eq!(updated.body["items"][0]["quantity"], 4);
    assert_eq!(updated.body["items"][0]["linePrice"], "$40.00");

    let updated = app
        .post("/cart/update", json!({ "id": "P1", "quantity": 2 }))
        .await;
    assert_eq!(updated.body["itemCount"], 2);

    let removed = app.post("/cart/remove", json!({ "id": "P1" })).await;
    assert_eq!(removed.body["itemCount"], 0);

    // Removing again is a no-op
    let removed = app.post("/cart/remove", json!({ "id": line_id })).await;
    assert_eq!(removed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let app = TestApp::local().await;
    app.post("/cart/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;

    let response = app
        .post("/cart/update", json!({ "id": "P1", "quantity": 0 }))
        .await;
    assert!(response.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_persists_as_absent_key() {
    let app = TestApp::local().await;
    app.post("/cart/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;
    app.flush().await;
    assert!(app.medium.peek("cart").is_some());

    let response = app.post("/cart/clear", json!({})).await;
    assert_eq!(response.body["itemCount"], 0);
    app.flush().await;
    assert_eq!(app.medium.peek("cart"), None);
}

#[tokio::test]
async fn test_out_of_range_price_is_rejected_and_not_persisted() {
    let app = TestApp::local().await;

    let response = app
        .post(
            "/cart/add",
            product_json("P1", "Keycraft 65", "79228162514264337593543950335"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post("/cart/add", product_json("P1", "Keycraft 65", "-10.00"))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let cart = app.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["itemCount"], 0);
    app.flush().await;
    assert_eq!(app.medium.peek("cart"), None);
}

#[tokio::test]
async fn test_largest_price_totals_stay_readable() {
    let app = TestApp::local().await;

    let mut body = product_json("P1", "Keycraft 65", "9999999999.99");
    body["quantity"] = json!(u32::MAX);
    let response = app.post("/cart/add", body.clone()).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app.post("/cart/add", body).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["itemCount"], u32::MAX);

    app.flush().await;
    assert!(app.medium.peek("cart").is_some());
    let cart = app.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestApp::local().await;
    let response = app.post("/cart/add", json!({ "id": "P1" })).await;
    assert!(response.status.is_client_error());
}

// =============================================================================
// Wishlist
// =============================================================================

#[tokio::test]
async fn test_wishlist_add_is_idempotent() {
    let app = TestApp::local().await;
    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    let response = app
        .post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["items"][0]["id"], "P2");

    let contains = app.get("/wishlist/contains/P2").await;
    assert_eq!(contains.body["contains"], true);
    let contains = app.get("/wishlist/contains/P9").await;
    assert_eq!(contains.body["contains"], false);
}

#[tokio::test]
async fn test_move_to_cart_keeps_wishlist_entry() {
    let app = TestApp::local().await;
    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;

    let moved = app
        .post("/wishlist/move-to-cart", json!({ "id": "P2" }))
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.body["itemCount"], 1);
    assert!(moved.body["cartItemId"].as_str().unwrap().starts_with("P2-"));

    let wishlist = app.get("/wishlist").await;
    assert_eq!(wishlist.body["count"], 1);

    let missing = app
        .post("/wishlist/move-to-cart", json!({ "id": "P9" }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_remove_and_clear() {
    let app = TestApp::local().await;
    app.post("/wishlist/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;
    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;

    let response = app.post("/wishlist/remove", json!({ "id": "P1" })).await;
    assert_eq!(response.body["count"], 1);

    let response = app.post("/wishlist/clear", json!({})).await;
    assert_eq!(response.body["count"], 0);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::local().await;

    let status = app.get("/auth").await;
    assert_eq!(status.body["signedIn"], false);

    let login = app
        .post(
            "/auth/login",
            json!({ "email": "admin@example.com", "password": "admin123" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["isAdmin"], true);
    assert!(app.medium.peek("user").is_some());

    let logout = app.post("/auth/logout", json!({})).await;
    assert_eq!(logout.body["signedIn"], false);
    assert_eq!(app.medium.peek("user"), None);
}

#[tokio::test]
async fn test_login_rejects_empty_password() {
    let app = TestApp::local().await;
    let response = app
        .post(
            "/auth/login",
            json!({ "email": "shopper@example.com", "password": "" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid credentials");
}
