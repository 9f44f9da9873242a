//! OAuth and App Bridge helpers.
//!
//! - Authorization URL construction for the install/re-auth redirect
//! - HMAC-SHA256 verification of the OAuth callback query
//! - Verification of App Bridge session tokens (HS256 JWTs signed with the
//!   app secret) sent as `Authorization: Bearer` by the embedded frontend
//! - Decoding the base64 `host` parameter into the admin URL of the app

use base64::Engine;
use giftlink_core::ShopDomain;
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::ShopifyAppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a callback `timestamp`, in seconds.
pub const CALLBACK_MAX_AGE_SECS: i64 = 90;

/// Clock skew tolerated on session token `exp`/`nbf`, in seconds.
const SESSION_TOKEN_LEEWAY_SECS: u64 = 5;

/// Build the URL that sends a merchant to Shopify to approve the app.
///
/// Requests an offline token (no `grant_options[]`).
#[must_use]
pub fn authorization_url(config: &ShopifyAppConfig, shop: &ShopDomain, state: &str) -> String {
    format!(
        "{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
        shop.origin(),
        urlencoding::encode(&config.api_key),
        urlencoding::encode(&config.scopes.to_string()),
        urlencoding::encode(&config.redirect_uri()),
        urlencoding::encode(state)
    )
}

/// Generate a random OAuth `state` nonce.
#[must_use]
pub fn new_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Callback HMAC
// =============================================================================

/// Parse a raw query string into decoded key/value pairs.
#[must_use]
pub fn query_pairs(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

/// The message Shopify signs: every pair except `hmac` and `signature`,
/// sorted by key, joined as `k=v` with `&`.
fn hmac_message(pairs: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex HMAC-SHA256 of the callback query, as Shopify computes it.
#[must_use]
pub fn sign_query(pairs: &[(String, String)], secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(hmac_message(pairs).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the `hmac` parameter of an OAuth callback query.
#[must_use]
pub fn verify_hmac(pairs: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = pairs.iter().find(|(k, _)| k == "hmac") else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(hmac_message(pairs).as_bytes());

    // Constant-time comparison
    mac.verify_slice(&provided).is_ok()
}

/// Whether a callback `timestamp` (unix seconds) is within the allowed window.
#[must_use]
pub fn timestamp_is_fresh(timestamp: &str, now: i64) -> bool {
    timestamp
        .parse::<i64>()
        .is_ok_and(|ts| (now - ts).abs() <= CALLBACK_MAX_AGE_SECS)
}

// =============================================================================
// Session tokens
// =============================================================================

/// Session token verification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("session token expired")]
    Expired,
    #[error("session token signature invalid")]
    SignatureInvalid,
    #[error("session token audience mismatch")]
    BadAudience,
    #[error("session token destination is not a shop")]
    BadDestination,
    #[error("malformed session token")]
    Malformed,
}

/// App Bridge session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Shop admin URL (`https://{shop}/admin`)
    pub iss: String,
    /// Shop URL (`https://{shop}`)
    pub dest: String,
    /// App API key
    pub aud: String,
    /// Staff member ID
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
}

impl SessionTokenClaims {
    /// The shop the token was issued for, taken from `dest`.
    ///
    /// # Errors
    ///
    /// Returns `BadDestination` if `dest` is not a shop URL or disagrees with `iss`.
    pub fn shop(&self) -> Result<ShopDomain, SessionTokenError> {
        let dest = url::Url::parse(&self.dest).map_err(|_| SessionTokenError::BadDestination)?;
        let host = dest.host_str().ok_or(SessionTokenError::BadDestination)?;
        let shop = ShopDomain::parse(host).map_err(|_| SessionTokenError::BadDestination)?;

        let iss_host = url::Url::parse(&self.iss)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        if iss_host.as_deref() != Some(shop.as_str()) {
            return Err(SessionTokenError::BadDestination);
        }

        Ok(shop)
    }
}

/// Verify an App Bridge session token and return the shop it belongs to.
///
/// # Errors
///
/// Returns a `SessionTokenError` describing why the token was rejected.
pub fn verify_session_token(
    token: &str,
    config: &ShopifyAppConfig,
) -> Result<ShopDomain, SessionTokenError> {
    use secrecy::ExposeSecret;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.api_key.as_str()]);
    validation.set_required_spec_claims(&["exp", "nbf", "aud"]);
    validation.validate_nbf = true;
    validation.leeway = SESSION_TOKEN_LEEWAY_SECS;

    let key = DecodingKey::from_secret(config.api_secret.expose_secret().as_bytes());
    let data = decode::<SessionTokenClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => SessionTokenError::SignatureInvalid,
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
            | jsonwebtoken::errors::ErrorKind::ImmatureSignature => SessionTokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => SessionTokenError::BadAudience,
            _ => SessionTokenError::Malformed,
        }
    })?;

    data.claims.shop()
}

// =============================================================================
// Embedded app URL
// =============================================================================

/// Shopify admin hostname for unified-admin `host` values.
const ADMIN_HOSTNAME: &str = "admin.shopify.com";

/// Decode the base64 `host` parameter Shopify appends to app URLs.
///
/// The parameter is unsigned, so it is only accepted when it decodes to a
/// path on `admin.shopify.com` or on a `*.myshopify.com` shop, such as
/// `admin.shopify.com/store/acme` or `acme.myshopify.com/admin`.
#[must_use]
pub fn decode_host(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_end_matches('=');
    let bytes = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(trimmed)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    let valid = !decoded.is_empty()
        && !decoded.contains("://")
        && !decoded.starts_with('/')
        && decoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/'));
    if !valid {
        return None;
    }

    let hostname = decoded.split('/').next().unwrap_or_default();
    let is_shopify =
        hostname.eq_ignore_ascii_case(ADMIN_HOSTNAME) || ShopDomain::parse(hostname).is_ok();
    is_shopify.then_some(decoded)
}

/// URL of the app inside Shopify admin for a base64 `host` parameter.
#[must_use]
pub fn embedded_app_url(host: &str, api_key: &str) -> Option<String> {
    decode_host(host).map(|h| format!("https://{h}/apps/{api_key}"))
}
