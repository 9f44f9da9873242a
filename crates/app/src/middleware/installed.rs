//! Installed-shop guard for the frontend.
//!
//! The SPA shell is only served to shops that completed OAuth. Anything
//! else is sent through the install flow first.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use giftlink_core::ShopDomain;

use crate::config::{EXIT_IFRAME_PATH, ShopifyAppConfig};
use crate::error::AppError;
use crate::session::ShopSession;
use crate::shopify::oauth::{embedded_app_url, query_pairs};
use crate::state::AppState;

/// Middleware that requires the `shop` query parameter to name an installed shop.
///
/// - Missing or invalid `shop`: 422 `No shop provided`
/// - No active session: redirect into OAuth (through `/exitiframe` when
///   rendered inside the admin)
/// - Embedded app opened outside the admin: redirect into the admin
pub async fn ensure_installed_on_shop(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path == EXIT_IFRAME_PATH {
        return next.run(request).await;
    }

    let params = query_pairs(request.uri().query().unwrap_or_default());
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let Some(shop) = param("shop").and_then(|s| ShopDomain::parse(s).ok()) else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "No shop provided").into_response();
    };
    let host = param("host");
    let in_admin = param("embedded") == Some("1");
    let config = &state.config().shopify;

    let stored = match state
        .sessions()
        .load_session(&ShopSession::offline_id(&shop))
        .await
    {
        Ok(stored) => stored,
        Err(e) => return AppError::from(e).into_response(),
    };

    if !stored.is_some_and(|s| s.is_active(&config.scopes)) {
        tracing::info!(shop = %shop, "Shop not installed, redirecting to auth");
        return Redirect::to(&auth_redirect(config, &shop, host, in_admin)).into_response();
    }

    if config.embedded && !in_admin {
        if let Some(app_url) = host.and_then(|h| embedded_app_url(h, &config.api_key)) {
            return Redirect::to(&format!("{app_url}{path}")).into_response();
        }
    }

    next.run(request).await
}

/// Where to send a shop that needs to (re)run OAuth.
///
/// OAuth can't run inside the admin iframe, so embedded requests go through
/// the frontend's exit-iframe page, which navigates the top window.
fn auth_redirect(
    config: &ShopifyAppConfig,
    shop: &ShopDomain,
    host: Option<&str>,
    in_admin: bool,
) -> String {
    if !in_admin {
        return format!(
            "{}?shop={}",
            config.auth_path,
            urlencoding::encode(shop.as_str())
        );
    }

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("shop", shop.as_str());
    if let Some(host) = host {
        query.append_pair("host", host);
    }
    query.append_pair("redirectUri", &config.auth_url_for(shop));
    format!("{EXIT_IFRAME_PATH}?{}", query.finish())
}
