//! CLI command implementations.

pub mod count;
pub mod seed;

use giftlink_app::session::{Scopes, ShopSession};
use giftlink_app::shopify::RestClient;
use giftlink_core::ShopDomain;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2024-01";

/// Errors setting up a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0} not set")]
    MissingEnvVar(&'static str),
}

/// Build a client and session for `shop` from `SHOPIFY_ACCESS_TOKEN`.
///
/// The token is used as-is; its scopes are not checked up front.
fn shop_client(shop: ShopDomain) -> Result<(RestClient, ShopSession), CommandError> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let token = std::env::var("SHOPIFY_ACCESS_TOKEN")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOPIFY_ACCESS_TOKEN"))?;
    let api_version =
        std::env::var("SHOPIFY_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

    let client = RestClient::without_oauth(&api_version);
    let session = ShopSession::offline(shop, token, Scopes::default());
    Ok((client, session))
}
