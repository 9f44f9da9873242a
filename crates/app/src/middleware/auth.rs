//! Session validation for API routes.
//!
//! A request is authenticated when it names a shop, either through an App
//! Bridge session token (`Authorization: Bearer ...`) or through the cookie
//! session set at the end of OAuth, and that shop has an active offline
//! session in storage.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use giftlink_core::ShopDomain;
use tower_sessions::Session;
use tracing::Span;

use crate::error::{AppError, set_sentry_shop};
use crate::session::ShopSession;
use crate::shopify::oauth::verify_session_token;
use crate::state::AppState;

use super::session::session_keys;

/// Tells App Bridge the request failed for lack of a valid session.
pub const REAUTHORIZE_HEADER: &str = "x-shopify-api-request-failure-reauthorize";
/// Where App Bridge should send the merchant to re-authenticate.
pub const REAUTHORIZE_URL_HEADER: &str = "x-shopify-api-request-failure-reauthorize-url";

/// Extractor for the session attached by [`validate_authenticated_session`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     format!("Hello, {}!", session.shop)
/// }
/// ```
pub struct CurrentSession(pub ShopSession);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ShopSession>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("no shop session".to_string()))
    }
}

/// Rejection for requests without an active shop session.
struct Unauthenticated {
    reauthorize_url: Option<String>,
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        let headers = response.headers_mut();
        headers.insert(REAUTHORIZE_HEADER, HeaderValue::from_static("1"));
        if let Some(value) = self
            .reauthorize_url
            .and_then(|url| HeaderValue::from_str(&url).ok())
        {
            headers.insert(REAUTHORIZE_URL_HEADER, value);
        }
        response
    }
}

/// Middleware that rejects requests without an active shop session.
///
/// On success the [`ShopSession`] is placed in request extensions for
/// [`CurrentSession`].
pub async fn validate_authenticated_session(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let shopify = &state.config().shopify;

    let Some(shop) = request_shop(&state, request.headers(), &session).await else {
        tracing::debug!("No shop on request");
        return Unauthenticated {
            reauthorize_url: None,
        }
        .into_response();
    };

    let stored = match state
        .sessions()
        .load_session(&ShopSession::offline_id(&shop))
        .await
    {
        Ok(stored) => stored,
        Err(e) => return AppError::from(e).into_response(),
    };

    let Some(shop_session) = stored.filter(|s| s.is_active(&shopify.scopes)) else {
        tracing::info!(shop = %shop, "No active session for shop");
        return Unauthenticated {
            reauthorize_url: Some(shopify.auth_url_for(&shop)),
        }
        .into_response();
    };

    Span::current().record("shop", shop.as_str());
    set_sentry_shop(shop.as_str());

    request.extensions_mut().insert(shop_session);
    next.run(request).await
}

/// Shop named by the bearer session token, or else by the cookie session.
///
/// A bearer token that fails verification is not retried against the cookie.
/// Embedded apps accept session tokens only.
async fn request_shop(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Option<ShopDomain> {
    if let Some(token) = bearer_token(headers) {
        return match verify_session_token(token, &state.config().shopify) {
            Ok(shop) => Some(shop),
            Err(e) => {
                tracing::info!(error = %e, "Rejected session token");
                None
            }
        };
    }

    if state.config().shopify.embedded {
        return None;
    }

    session
        .get::<String>(session_keys::SHOP)
        .await
        .ok()
        .flatten()
        .and_then(|shop| ShopDomain::parse(&shop).ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_unauthenticated_headers() {
        let response = Unauthenticated {
            reauthorize_url: Some(
                "https://giftlink.ngrok.app/api/auth?shop=acme.myshopify.com".to_string(),
            ),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[REAUTHORIZE_HEADER], "1");
        assert_eq!(
            response.headers()[REAUTHORIZE_URL_HEADER],
            "https://giftlink.ngrok.app/api/auth?shop=acme.myshopify.com"
        );

        let response = Unauthenticated {
            reauthorize_url: None,
        }
        .into_response();
        assert!(response.headers().get(REAUTHORIZE_URL_HEADER).is_none());
    }
}
