//! Shopify platform adapter.
//!
//! Everything the app needs from Shopify lives here:
//! - [`ShopifyApi`] - REST Admin resources (products, checkouts) and the
//!   OAuth code exchange, implemented over HTTP by [`RestClient`]
//! - [`oauth`] - authorization URLs, callback HMAC verification, App Bridge
//!   session tokens and embedded-app URLs
//!
//! # Example
//!
//! ```rust,ignore
//! use giftlink_app::shopify::{RestClient, ShopifyApi};
//!
//! let client = RestClient::new(&config.shopify);
//!
//! let count = client.product_count(&session).await?;
//! let product = client.get_product(&session, ProductId::new(632910392)).await?;
//! ```

mod client;
pub mod oauth;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use client::{RestClient, ShopifyApi};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify REST Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth code exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body.
        message: String,
    },
}

impl ShopifyError {
    /// Whether the error means the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
