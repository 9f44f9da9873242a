//! OAuth install flow.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use giftlink_integration_tests::{
    API_KEY, HOST, SHOP, TestContext, signed_callback_query, state_from_authorize_url,
};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Run the begin step and return (session cookie, OAuth state).
async fn begin(ctx: &TestContext, shop: &str) -> (String, String) {
    let response = ctx.get(&format!("/api/auth?shop={shop}")).await;
    assert!(response.status.is_redirection());
    let cookie = response.session_cookie().unwrap();
    let state = state_from_authorize_url(response.location());
    (cookie, state)
}

#[tokio::test]
async fn test_begin_redirects_to_authorize() {
    let ctx = TestContext::new();

    let response = ctx.get("/api/auth?shop=ACME.myshopify.com").await;
    assert!(response.status.is_redirection());

    let location = response.location();
    assert!(location.starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
    assert!(location.contains(&format!("client_id={API_KEY}")));
    assert!(location.contains("scope=write_products%2Cwrite_checkouts"));
    assert!(location.contains(
        "redirect_uri=https%3A%2F%2Fgiftlink.ngrok.app%2Fapi%2Fauth%2Fcallback"
    ));
    assert!(!state_from_authorize_url(location).is_empty());
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_begin_rejects_invalid_shop() {
    let ctx = TestContext::new();

    assert_eq!(
        ctx.get("/api/auth?shop=evil.example.com").await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(ctx.get("/api/auth").await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_install_flow() {
    let ctx = TestContext::new();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert!(response.status.is_redirection());
    assert_eq!(
        response.location(),
        format!("https://admin.shopify.com/store/acme/apps/{API_KEY}/")
    );
    assert_eq!(ctx.shopify.exchanged_codes(), vec!["c0de".to_string()]);

    let session = ctx.load_session(SHOP).await.unwrap();
    assert_eq!(session.id, "offline_acme.myshopify.com");

    // Embedded API calls carry a session token
    ctx.shopify.set_count(9);
    let response = ctx.get_as("/api/products/count", SHOP).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["count"], 9);
}

#[tokio::test]
async fn test_embedded_api_ignores_session_cookie() {
    let ctx = TestContext::new();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;
    assert!(response.status.is_redirection());

    for uri in [
        "/api/products/create",
        "/api/gift?product_id=10&variant_id=100",
    ] {
        let response = ctx.get_with_cookie(uri, &cookie).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    assert!(ctx.shopify.created_products().is_empty());
    assert!(ctx.shopify.created_checkouts().is_empty());
}

#[tokio::test]
async fn test_non_embedded_install_lands_on_app_root() {
    let ctx = TestContext::with_vars(&[("SHOPIFY_EMBEDDED", "false")]);
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert!(response.status.is_redirection());
    assert_eq!(
        response.location(),
        format!("/?shop=acme.myshopify.com&host={HOST}")
    );

    // Outside the admin the cookie identifies the shop
    ctx.shopify.set_count(9);
    let response = ctx.get_with_cookie("/api/products/count", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["count"], 9);
}

#[tokio::test]
async fn test_callback_rejects_bad_hmac() {
    let ctx = TestContext::new();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now()).replace("c0de", "f00d");
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.shopify.exchanged_codes().is_empty());
    assert!(ctx.load_session(SHOP).await.is_none());
}

#[tokio::test]
async fn test_callback_rejects_stale_timestamp() {
    let ctx = TestContext::new();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now() - 3_600);
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.shopify.exchanged_codes().is_empty());
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let ctx = TestContext::new();
    let (cookie, _state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, "forged", "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.shopify.exchanged_codes().is_empty());
}

#[tokio::test]
async fn test_callback_rejects_other_shop() {
    let ctx = TestContext::new();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query("other.myshopify.com", &state, "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_cookie_restarts_oauth() {
    let ctx = TestContext::new();

    let query = signed_callback_query(SHOP, "whatever", "c0de", now());
    let response = ctx.get(&format!("/api/auth/callback?{query}")).await;

    assert!(response.status.is_redirection());
    assert_eq!(response.location(), "/api/auth?shop=acme.myshopify.com");
    assert!(ctx.shopify.exchanged_codes().is_empty());
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let ctx = TestContext::new();
    ctx.shopify.fail_exchange();
    let (cookie, state) = begin(&ctx, SHOP).await;

    let query = signed_callback_query(SHOP, &state, "c0de", now());
    let response = ctx
        .get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie)
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.load_session(SHOP).await.is_none());
}

#[tokio::test]
async fn test_callback_with_error_param() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/api/auth/callback?error=access_denied&shop=acme.myshopify.com")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
