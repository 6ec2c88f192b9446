//! Integration tests for signing in, reloading and signing out.
//!
//! Run with: cargo test -p shopfront-integration-tests

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use shopfront_core::ProductId;
use shopfront_integration_tests::{TestContext, product_json};
use shopfront_storefront::api::ApiError;
use shopfront_storefront::persistence::SessionStorage;
use shopfront_storefront::{AppError, FileStorage};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn password() -> SecretString {
    SecretString::from("hunter2".to_string())
}

async fn mock_wishlist(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/api/wishlist/u1"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json("shirt", "Shirt", "20.00"),
            product_json("hat", "Hat", "12.50")
        ])))
        .mount(&ctx.server)
        .await;
}

// ============================================================================
// Sign In Tests
// ============================================================================

#[tokio::test]
async fn test_sign_in_loads_wishlist_and_persists_identity() {
    let ctx = TestContext::new().await;
    ctx.mock_login("tok-1").await;
    mock_wishlist(&ctx).await;

    let mut shop = ctx.open();
    let user = shop.sign_in("ada@example.com", &password()).await.unwrap();
    assert_eq!(user.id.as_str(), "u1");
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));

    assert_eq!(shop.wishlist().count(), 2);
    assert!(shop.wishlist().contains(&ProductId::new("hat")));
    assert!(ctx.dir.path().join("auth.json").exists());
    drop(shop);

    // Identity comes back from disk; the wishlist is re-fetched on demand
    let mut reopened = ctx.open();
    assert!(reopened.is_signed_in());
    assert!(reopened.wishlist().is_empty());
    assert_eq!(reopened.refresh_wishlist().await.unwrap(), 2);
}

#[tokio::test]
async fn test_rejected_credentials_stay_signed_out() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;

    let mut shop = ctx.open();
    let err = shop.sign_in("ada@example.com", &password()).await.unwrap_err();

    assert!(matches!(err, AppError::Api(ApiError::Unauthorized(_))));
    assert!(!shop.is_signed_in());
    assert!(!ctx.dir.path().join("auth.json").exists());
}

// ============================================================================
// Wishlist Tests
// ============================================================================

#[tokio::test]
async fn test_wishlist_add_is_deduplicated() {
    let ctx = TestContext::new().await;
    ctx.mock_login("tok-1").await;
    mock_wishlist(&ctx).await;
    ctx.mock_product("scarf", "Scarf", "30.00").await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&ctx.server)
        .await;

    let mut shop = ctx.open();
    shop.sign_in("ada@example.com", &password()).await.unwrap();
    let scarf = shop.fetch_product(&ProductId::new("scarf")).await.unwrap();

    assert!(shop.add_to_wishlist(&scarf).await.unwrap());
    assert!(!shop.add_to_wishlist(&scarf).await.unwrap());
    assert_eq!(shop.wishlist().count(), 3);
}

#[tokio::test]
async fn test_failed_wishlist_remove_resyncs() {
    let ctx = TestContext::new().await;
    ctx.mock_login("tok-1").await;
    mock_wishlist(&ctx).await;
    Mock::given(method("DELETE"))
        .and(path("/api/wishlist/u1/hat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;

    let mut shop = ctx.open();
    shop.sign_in("ada@example.com", &password()).await.unwrap();

    let err = shop
        .remove_from_wishlist(&ProductId::new("hat"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Api(ApiError::Status { .. })));
    assert!(shop.wishlist().contains(&ProductId::new("hat")));
    assert_eq!(shop.wishlist().count(), 2);
}

// ============================================================================
// Sign Out Tests
// ============================================================================

#[tokio::test]
async fn test_forbidden_response_signs_out_and_clears_state() {
    let ctx = TestContext::new().await;
    ctx.mock_login("tok-1").await;
    mock_wishlist(&ctx).await;
    ctx.mock_product("shirt", "Shirt", "20.00").await;
    Mock::given(method("POST"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&ctx.server)
        .await;

    let mut shop = ctx.open();
    shop.sign_in("ada@example.com", &password()).await.unwrap();
    let shirt = shop.fetch_product(&ProductId::new("shirt")).await.unwrap();
    shop.add_to_cart(&shirt, 1).await.unwrap();

    let err = shop.add_to_wishlist(&shirt).await.unwrap_err();

    assert!(matches!(err, AppError::Api(ApiError::Unauthorized(_))));
    assert!(!shop.is_signed_in());
    assert!(shop.cart().is_empty());
    assert!(shop.wishlist().is_empty());
    drop(shop);

    let reopened = ctx.open();
    assert!(!reopened.is_signed_in());
    assert!(reopened.cart().is_empty());
}

#[tokio::test]
async fn test_reset_removes_session_files() {
    let ctx = TestContext::new().await;
    ctx.mock_login("tok-1").await;
    mock_wishlist(&ctx).await;

    let mut shop = ctx.open();
    shop.sign_in("ada@example.com", &password()).await.unwrap();
    shop.reset().unwrap();

    let storage = FileStorage::new(ctx.dir.path());
    assert!(storage.get_item("auth").unwrap().is_none());
    assert!(storage.get_item("cart").unwrap().is_none());
}
