//! `/api/gift` checkout links.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use giftlink_app::shopify::ShopifyError;
use giftlink_core::VariantId;
use giftlink_integration_tests::{CHECKOUT_URL, SHOP, TestContext};

async fn installed_with_product() -> TestContext {
    let ctx = TestContext::new();
    ctx.install_default().await;
    ctx.shopify.add_product(10, &[100, 101]);
    ctx
}

#[tokio::test]
async fn test_gift_returns_checkout_url() {
    let ctx = installed_with_product().await;

    let response = ctx
        .get_as("/api/gift?product_id=10&variant_id=101", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["checkout_url"], CHECKOUT_URL);

    let checkouts = ctx.shopify.created_checkouts();
    assert_eq!(checkouts.len(), 1);
    assert_eq!(checkouts[0].line_items.len(), 1);
    assert_eq!(checkouts[0].line_items[0].variant_id, VariantId::new(101));
    assert_eq!(checkouts[0].line_items[0].quantity, 1);
}

#[tokio::test]
async fn test_gift_accepts_gids() {
    let ctx = installed_with_product().await;

    let response = ctx
        .get_as(
            "/api/gift?product_id=gid%3A%2F%2Fshopify%2FProduct%2F10\
             &variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F100",
            SHOP,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_gift_requires_both_ids() {
    let ctx = installed_with_product().await;

    for uri in [
        "/api/gift",
        "/api/gift?product_id=10",
        "/api/gift?variant_id=100",
        "/api/gift?product_id=&variant_id=100",
    ] {
        let response = ctx.get_as(uri, SHOP).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response.text(), "product_id and variant_id is required");
    }

    assert!(ctx.shopify.created_checkouts().is_empty());
}

#[tokio::test]
async fn test_gift_rejects_malformed_ids() {
    let ctx = installed_with_product().await;

    let response = ctx
        .get_as("/api/gift?product_id=ten&variant_id=100", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.shopify.created_checkouts().is_empty());
}

#[tokio::test]
async fn test_gift_unknown_product() {
    let ctx = installed_with_product().await;

    let response = ctx
        .get_as("/api/gift?product_id=99&variant_id=100", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "product not found");
}

#[tokio::test]
async fn test_gift_variant_of_other_product() {
    let ctx = installed_with_product().await;
    ctx.shopify.add_product(20, &[200]);

    let response = ctx
        .get_as("/api/gift?product_id=10&variant_id=200", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "variant not found");
    assert!(ctx.shopify.created_checkouts().is_empty());
}

#[tokio::test]
async fn test_gift_upstream_failure_is_sanitized() {
    let ctx = installed_with_product().await;
    ctx.shopify.fail_with(ShopifyError::Api {
        status: 500,
        message: "internal: shard 7 unavailable".to_string(),
    });

    let response = ctx
        .get_as("/api/gift?product_id=10&variant_id=100", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Shopify request failed");
    assert!(!response.text().contains("shard"));
}

#[tokio::test]
async fn test_gift_checkout_without_url() {
    let ctx = installed_with_product().await;
    ctx.shopify.set_checkout_url(None);

    let response = ctx
        .get_as("/api/gift?product_id=10&variant_id=100", SHOP)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "checkout has no URL");
}
