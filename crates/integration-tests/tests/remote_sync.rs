//! Integration tests for the remote wishlist.
//!
//! The storefront runs against [`MemoryWishlistTable`], whose change
//! notifications play the part of the database trigger. Mutations are
//! answered before the table is touched, so tests wait on the adapter's
//! reload counter before reading.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde_json::json;
use tokio::sync::watch;

use keycraft_core::{Email, ItemDetails, Price};
use keycraft_integration_tests::{TestApp, product_json};
use keycraft_storefront::sync::WishlistTable;

const SHOPPER: &str = "shopper@example.com";

fn revisions(app: &TestApp) -> watch::Receiver<u64> {
    app.state.context().wishlist().remote().unwrap().revisions()
}

async fn next_reload(revisions: &mut watch::Receiver<u64>) {
    tokio::time::timeout(Duration::from_secs(5), revisions.changed())
        .await
        .expect("wishlist reloaded in time")
        .unwrap();
}

async fn sign_in(app: &TestApp) {
    let response = app
        .post("/auth/login", json!({ "email": SHOPPER, "password": "pw" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_signed_out_mutation_redirects_to_sign_in() {
    let app = TestApp::remote().await;

    let response = app
        .post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.headers[header::LOCATION], "/auth");
    assert_eq!(app.table.as_ref().unwrap().mutations(), 0);

    let wishlist = app.get("/wishlist").await;
    assert_eq!(wishlist.body["count"], 0);
}

#[tokio::test]
async fn test_add_is_visible_after_reload() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let mut revisions = revisions(&app);

    let response = app
        .post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "dispatched");

    next_reload(&mut revisions).await;
    let wishlist = app.get("/wishlist").await;
    assert_eq!(wishlist.body["count"], 1);
    assert_eq!(wishlist.body["items"][0]["id"], "P2");

    let contains = app.get("/wishlist/contains/P2").await;
    assert_eq!(contains.body["contains"], true);
}

#[tokio::test]
async fn test_remove_and_clear_round_trip_through_table() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let mut revisions = revisions(&app);

    app.post("/wishlist/add", product_json("P1", "Keycraft 65", "10.00"))
        .await;
    next_reload(&mut revisions).await;
    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    next_reload(&mut revisions).await;

    let response = app.post("/wishlist/remove", json!({ "id": "P1" })).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    next_reload(&mut revisions).await;
    assert_eq!(app.get("/wishlist").await.body["count"], 1);

    let response = app.post("/wishlist/clear", json!({})).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    next_reload(&mut revisions).await;
    assert_eq!(app.get("/wishlist").await.body["count"], 0);

    let user = Email::parse(SHOPPER).unwrap().user_id();
    assert!(app.table.as_ref().unwrap().rows_for(user).is_empty());
}

#[tokio::test]
async fn test_other_users_changes_do_not_leak() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let table = app.table.clone().unwrap();
    let mut revisions = revisions(&app);

    let stranger = Email::parse("someone@example.com").unwrap().user_id();
    table
        .insert(
            stranger,
            &ItemDetails::new("P9", "Switch tester", Price::from_cents(1500)).into(),
        )
        .await
        .unwrap();

    // Our own change afterwards proves the stranger's event was processed.
    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    next_reload(&mut revisions).await;

    let wishlist = app.get("/wishlist").await;
    assert_eq!(wishlist.body["count"], 1);
    assert_eq!(wishlist.body["items"][0]["id"], "P2");
}

#[tokio::test]
async fn test_logout_clears_mirror() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let mut revisions = revisions(&app);

    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    next_reload(&mut revisions).await;
    assert_eq!(app.get("/wishlist").await.body["count"], 1);

    app.post("/auth/logout", json!({})).await;
    assert_eq!(app.get("/wishlist").await.body["count"], 0);

    // Signing back in restores the rows from the table.
    sign_in(&app).await;
    assert_eq!(app.get("/wishlist").await.body["count"], 1);
}

#[tokio::test]
async fn test_move_to_cart_from_remote_wishlist() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let mut revisions = revisions(&app);

    app.post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    next_reload(&mut revisions).await;

    let moved = app
        .post("/wishlist/move-to-cart", json!({ "id": "P2" }))
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(app.get("/cart").await.body["subtotal"], "$45.00");
    assert_eq!(app.get("/wishlist").await.body["count"], 1);
}

#[tokio::test]
async fn test_failed_dispatch_leaves_mirror_unchanged() {
    let app = TestApp::remote().await;
    sign_in(&app).await;
    let table = app.table.clone().unwrap();
    table.set_failing(true);

    let response = app
        .post("/wishlist/add", product_json("P2", "Keycaps", "45.00"))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    // Give the dispatched insert a chance to run and fail.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(table.mutations(), 1);
    assert_eq!(app.get("/wishlist").await.body["count"], 0);
}
