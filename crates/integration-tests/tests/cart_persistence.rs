//! Integration tests for cart and wishlist persistence.
//!
//! These tests drive providers against real storage media (memory and a
//! temporary directory) and check what survives a remount.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use keycraft_core::{ItemDetails, Price, ProductId, VariantAttributes};
use keycraft_integration_tests::DEBOUNCE;
use keycraft_storefront::context::{CartProvider, WishlistProvider};
use keycraft_storefront::persistence::{FileStore, MemoryStore, Storage};

fn p1() -> ItemDetails {
    ItemDetails::new("P1", "Keycraft 65", Price::from_cents(1000))
}

// =============================================================================
// Merge & Quantity Rules
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_same_item_twice_merges_into_one_line() {
    let cart = CartProvider::mount(&Storage::memory(), DEBOUNCE).await.unwrap();
    cart.add(p1(), 1);
    cart.add(p1(), 2);

    let lines = cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(cart.subtotal().to_string(), "$30.00");
}

#[tokio::test(start_paused = true)]
async fn test_switch_variants_are_separate_lines() {
    let cart = CartProvider::mount(&Storage::memory(), DEBOUNCE).await.unwrap();
    cart.add(p1().with_variant(VariantAttributes::switch("brown")), 1);
    cart.add(p1().with_variant(VariantAttributes::switch("red")), 1);

    assert_eq!(cart.len(), 2);
    assert_eq!(cart.item_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_or_negative_quantity_removes() {
    let cart = CartProvider::mount(&Storage::memory(), DEBOUNCE).await.unwrap();
    let first = cart.add(p1(), 2);
    let second = cart.add(ItemDetails::new("P2", "Keycaps", Price::from_cents(4500)), 1);

    assert!(cart.update_quantity(first.as_str(), 0));
    assert!(cart.update_quantity(second.as_str(), -1));
    assert!(cart.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remove_is_idempotent() {
    let cart = CartProvider::mount(&Storage::memory(), DEBOUNCE).await.unwrap();
    let line = cart.add(p1(), 1);

    assert!(cart.remove(line.as_str()));
    assert!(!cart.remove(line.as_str()));
    assert!(!cart.remove("never-added"));
    assert!(cart.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wishlist_add_twice_keeps_one_entry() {
    let wishlist = WishlistProvider::mount(&Storage::memory(), DEBOUNCE)
        .await
        .unwrap();
    assert!(wishlist.add(p1().into()));
    assert!(!wishlist.add(p1().into()));
    assert_eq!(wishlist.len(), 1);
}

// =============================================================================
// Persist & Rehydrate
// =============================================================================

#[tokio::test]
async fn test_file_snapshot_survives_remount() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(FileStore::new(dir.path()));

    let cart = CartProvider::mount(&storage, DEBOUNCE).await.unwrap();
    cart.add(p1(), 2);
    cart.add(
        ItemDetails::new("P2", "Keycaps", Price::from_cents(4550))
            .with_variant(VariantAttributes::switch("brown").with_layout("ansi")),
        1,
    );
    let subtotal = cart.subtotal();
    let lines = cart.lines();
    cart.unmount().await;

    assert!(dir.path().join("cart.json").exists());

    let storage = Storage::new(FileStore::new(dir.path()));
    let cart = CartProvider::mount(&storage, DEBOUNCE).await.unwrap();
    assert_eq!(cart.subtotal(), subtotal);
    assert_eq!(cart.lines(), lines);
}

#[tokio::test]
async fn test_clear_then_persist_leaves_no_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(FileStore::new(dir.path()));

    let cart = CartProvider::mount(&storage, DEBOUNCE).await.unwrap();
    cart.add(p1(), 1);
    cart.flush().await;
    assert!(dir.path().join("cart.json").exists());

    cart.clear();
    cart.flush().await;
    assert!(!dir.path().join("cart.json").exists());
}

#[tokio::test]
async fn test_legacy_snapshot_is_backfilled() {
    let medium = Arc::new(MemoryStore::new());
    medium.seed(
        "cart",
        r#"[
            {"id":"P1","name":"Keycraft 65","price":10,"quantity":1,"switchType":"brown"},
            {"id":"P2","name":"Keycaps","price":"45.50","quantity":2}
        ]"#,
    );
    let storage = Storage::from_arc(medium.clone());

    let cart = CartProvider::mount(&storage, DEBOUNCE).await.unwrap();
    let lines = cart.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].line_id.as_str().starts_with("P1-"));
    assert_ne!(lines[0].line_id, lines[1].line_id);
    assert_eq!(cart.subtotal().to_string(), "$101.00");

    // Still addressable by product id
    assert!(cart.update_quantity("P2", 3));
    assert!(cart.remove("P1"));
    assert_eq!(cart.item_count(), 3);

    // The next write upgrades the snapshot to the tagged format
    cart.flush().await;
    let value: serde_json::Value = serde_json::from_str(&medium.peek("cart").unwrap()).unwrap();
    assert_eq!(value["kind"], "cart");
    assert!(value["items"][0]["cartItemId"].is_string());
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let medium = Arc::new(MemoryStore::new());
    medium.seed("cart", "{\"kind\":\"cart\",\"items\":");
    medium.seed("wishlist", "42");
    let storage = Storage::from_arc(medium.clone());

    let cart = CartProvider::mount(&storage, DEBOUNCE).await.unwrap();
    let wishlist = WishlistProvider::mount(&storage, DEBOUNCE).await.unwrap();

    assert!(cart.is_empty());
    assert!(wishlist.is_empty());
    assert_eq!(medium.peek("cart"), None);
    assert_eq!(medium.peek("wishlist"), None);
}

#[tokio::test]
async fn test_wishlist_snapshot_survives_remount() {
    let medium = Arc::new(MemoryStore::new());
    let storage = Storage::from_arc(medium.clone());

    let wishlist = WishlistProvider::mount(&storage, DEBOUNCE).await.unwrap();
    wishlist.add(p1().with_image("/img/p1.png").into());
    wishlist.unmount().await;

    let wishlist = WishlistProvider::mount(&storage, DEBOUNCE).await.unwrap();
    assert!(wishlist.contains(&ProductId::new("P1")));
    assert_eq!(
        wishlist.get(&ProductId::new("P1")).unwrap().item.image,
        "/img/p1.png"
    );
}
