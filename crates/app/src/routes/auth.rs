//! OAuth install flow.
//!
//! `begin` sends the merchant to Shopify's authorize screen; `callback`
//! verifies Shopify's redirect, exchanges the code for an offline token,
//! stores the shop session and sends the merchant into the app.

use axum::{
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use giftlink_core::ShopDomain;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::ShopifyAppConfig;
use crate::error::AppError;
use crate::middleware::session::session_keys;
use crate::session::{Scopes, ShopSession};
use crate::shopify::oauth::{
    authorization_url, embedded_app_url, new_state, query_pairs, timestamp_is_fresh, verify_hmac,
};
use crate::state::AppState;

/// Query parameters for the begin route.
#[derive(Debug, Deserialize)]
pub struct BeginParams {
    pub shop: Option<String>,
}

/// GET {auth_path} - Start OAuth flow.
#[instrument(skip(state, session))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<BeginParams>,
) -> Response {
    let Some(shop) = params
        .shop
        .as_deref()
        .and_then(|s| ShopDomain::parse(s).ok())
    else {
        return (StatusCode::BAD_REQUEST, "Invalid shop provided").into_response();
    };

    // Random state parameter for CSRF protection
    let oauth_state = new_state();

    let stored = async {
        session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;
        session.insert(session_keys::OAUTH_SHOP, shop.as_str()).await
    };
    if let Err(e) = stored.await {
        tracing::error!("Failed to store OAuth state: {}", e);
        return AppError::Internal("failed to store OAuth state".to_string()).into_response();
    }

    let auth_url = authorization_url(&state.config().shopify, &shop, &oauth_state);

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Redirect::to(&auth_url).into_response()
}

/// GET {callback_path} - Handle OAuth callback.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Response {
    let config = &state.config().shopify;
    let pairs = query_pairs(query.as_deref().unwrap_or_default());
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    // Check for errors from Shopify
    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_default();
        tracing::error!("Shopify OAuth error: {} - {}", error, description);
        return (StatusCode::BAD_REQUEST, "OAuth authorization failed").into_response();
    }

    if !verify_hmac(&pairs, config.api_secret.expose_secret()) {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return (StatusCode::BAD_REQUEST, "Invalid OAuth callback signature").into_response();
    }

    let now = chrono::Utc::now().timestamp();
    if !param("timestamp").is_some_and(|ts| timestamp_is_fresh(ts, now)) {
        tracing::error!("Stale timestamp in OAuth callback");
        return (StatusCode::BAD_REQUEST, "OAuth callback has expired").into_response();
    }

    let Some(shop) = param("shop").and_then(|s| ShopDomain::parse(s).ok()) else {
        return (StatusCode::BAD_REQUEST, "Invalid shop provided").into_response();
    };

    let Some(code) = param("code").filter(|c| !c.is_empty()) else {
        tracing::error!("Missing authorization code in callback");
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    let stored_state: Option<String> = session
        .get(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();
    let stored_shop: Option<String> = session
        .get(session_keys::OAUTH_SHOP)
        .await
        .ok()
        .flatten();

    // Cookie lost (expired, other browser): start over rather than fail
    let Some(stored_state) = stored_state else {
        tracing::info!(shop = %shop, "No OAuth state in session, restarting OAuth");
        return Redirect::to(&begin_path(config, &shop)).into_response();
    };

    if param("state") != Some(stored_state.as_str()) || stored_shop.as_deref() != Some(shop.as_str())
    {
        tracing::error!("OAuth state mismatch - possible CSRF attack");
        return (StatusCode::BAD_REQUEST, "OAuth state mismatch").into_response();
    }

    // Clear the handshake state from session
    let _ = session.remove::<String>(session_keys::OAUTH_STATE).await;
    let _ = session.remove::<String>(session_keys::OAUTH_SHOP).await;

    let token = match state.shopify().exchange_code(&shop, code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to exchange OAuth code: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to complete OAuth")
                .into_response();
        }
    };

    let scope = Scopes::parse(&token.scope);
    if !scope.covers(&config.scopes) {
        tracing::warn!(granted = %scope, required = %config.scopes, "Shop granted fewer scopes than requested");
    }

    let shop_session =
        ShopSession::offline(shop.clone(), SecretString::from(token.access_token), scope);
    if let Err(e) = state.sessions().store_session(shop_session).await {
        return AppError::from(e).into_response();
    }

    if let Err(e) = session.insert(session_keys::SHOP, shop.as_str()).await {
        tracing::warn!("Failed to remember shop in cookie session: {}", e);
    }

    tracing::info!(shop = %shop, "Shop installed");
    Redirect::to(&app_root(config, &shop, param("host"))).into_response()
}

fn begin_path(config: &ShopifyAppConfig, shop: &ShopDomain) -> String {
    format!(
        "{}?shop={}",
        config.auth_path,
        urlencoding::encode(shop.as_str())
    )
}

/// Where to send the merchant once OAuth completes.
///
/// Embedded apps reload inside Shopify admin; others land on the app root.
fn app_root(config: &ShopifyAppConfig, shop: &ShopDomain, host: Option<&str>) -> String {
    if config.embedded {
        if let Some(url) = host.and_then(|h| embedded_app_url(h, &config.api_key)) {
            return format!("{url}/");
        }
    }

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("shop", shop.as_str());
    if let Some(host) = host {
        query.append_pair("host", host);
    }
    format!("/?{}", query.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(embedded: bool) -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_key: "a1b2c3d4e5f6".to_string(),
            api_secret: SecretString::from("4f3c2b1a9e8d7c6b5a4f3e2d1c0b9a87"),
            app_url: "https://giftlink.ngrok.app".to_string(),
            scopes: Scopes::parse("write_products"),
            api_version: "2024-01".to_string(),
            auth_path: "/api/auth".to_string(),
            callback_path: "/api/auth/callback".to_string(),
            embedded,
        }
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("acme.myshopify.com").unwrap()
    }

    const HOST: &str = "YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvYWNtZQ";

    #[test]
    fn test_app_root_embedded() {
        assert_eq!(
            app_root(&config(true), &shop(), Some(HOST)),
            "https://admin.shopify.com/store/acme/apps/a1b2c3d4e5f6/"
        );
    }

    #[test]
    fn test_app_root_embedded_without_host() {
        assert_eq!(
            app_root(&config(true), &shop(), None),
            "/?shop=acme.myshopify.com"
        );
    }

    #[test]
    fn test_app_root_not_embedded() {
        assert_eq!(
            app_root(&config(false), &shop(), Some(HOST)),
            format!("/?shop=acme.myshopify.com&host={HOST}")
        );
    }

    #[test]
    fn test_begin_path() {
        assert_eq!(
            begin_path(&config(true), &shop()),
            "/api/auth?shop=acme.myshopify.com"
        );
    }
}
