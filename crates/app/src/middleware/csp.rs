//! Frame-ancestors CSP for embedding in Shopify admin.
//!
//! Embedded apps must let the shop's admin frame them and nobody else.
//! Non-embedded apps, and requests that don't name a shop, can't be framed.

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue,
        header::{CONTENT_SECURITY_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};
use giftlink_core::ShopDomain;

use crate::shopify::oauth::query_pairs;
use crate::state::AppState;

/// Policy for responses that may not be framed.
const NO_FRAMING: &str = "frame-ancestors 'none';";

/// Add `Content-Security-Policy: frame-ancestors ...` to every response.
pub async fn frame_ancestors_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let shop = state
        .config()
        .shopify
        .embedded
        .then(|| request_shop(request.uri().query()))
        .flatten();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let policy = frame_ancestors(shop.as_ref());
    let value =
        HeaderValue::from_str(&policy).unwrap_or_else(|_| HeaderValue::from_static(NO_FRAMING));
    headers.insert(CONTENT_SECURITY_POLICY, value);
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    response
}

fn request_shop(query: Option<&str>) -> Option<ShopDomain> {
    query_pairs(query?)
        .into_iter()
        .find(|(k, _)| k == "shop")
        .and_then(|(_, v)| ShopDomain::parse(&v).ok())
}

/// The frame-ancestors directive for a shop, or `'none'` without one.
fn frame_ancestors(shop: Option<&ShopDomain>) -> String {
    shop.map_or_else(
        || NO_FRAMING.to_string(),
        |shop| format!("frame-ancestors {} https://admin.shopify.com;", shop.origin()),
    )
}
