//! REST Admin API client.
//!
//! [`ShopifyApi`] is the seam route handlers and services depend on, so
//! tests can swap in a fake. [`RestClient`] is the reqwest-backed
//! implementation used in production.

use std::sync::Arc;

use async_trait::async_trait;
use giftlink_core::{ProductId, ShopDomain};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::ShopifyAppConfig;
use crate::session::ShopSession;

use super::ShopifyError;
use super::types::{
    AccessTokenResponse, Checkout, CheckoutEnvelope, NewCheckout, NewProduct, Product,
    ProductCount, ProductEnvelope,
};

/// Header carrying the shop's access token on every Admin API call.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Seconds to wait when a 429 arrives without `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Operations the app performs against Shopify.
#[async_trait]
pub trait ShopifyApi: Send + Sync {
    /// Exchange an OAuth authorization code for an offline access token.
    async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ShopifyError>;

    /// Count the shop's products.
    async fn product_count(&self, session: &ShopSession) -> Result<ProductCount, ShopifyError>;

    /// Fetch a product with its variants.
    async fn get_product(
        &self,
        session: &ShopSession,
        id: ProductId,
    ) -> Result<Product, ShopifyError>;

    /// Create a product.
    async fn create_product(
        &self,
        session: &ShopSession,
        product: &NewProduct,
    ) -> Result<Product, ShopifyError>;

    /// Create a checkout.
    async fn create_checkout(
        &self,
        session: &ShopSession,
        checkout: &NewCheckout,
    ) -> Result<Checkout, ShopifyError>;
}

/// Shopify REST Admin API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    api_version: String,
    /// App credentials, only needed for the OAuth code exchange.
    credentials: Option<(String, SecretString)>,
}

impl RestClient {
    /// Create a client with the app's OAuth credentials.
    #[must_use]
    pub fn new(config: &ShopifyAppConfig) -> Self {
        Self::build(
            &config.api_version,
            Some((config.api_key.clone(), config.api_secret.clone())),
        )
    }

    /// Create a client that can only make Admin API calls with an existing token.
    #[must_use]
    pub fn without_oauth(api_version: &str) -> Self {
        Self::build(api_version, None)
    }

    fn build(api_version: &str, credentials: Option<(String, SecretString)>) -> Self {
        Self {
            inner: Arc::new(RestClientInner {
                client: reqwest::Client::new(),
                api_version: api_version.to_string(),
                credentials,
            }),
        }
    }

    /// Build an Admin API URL for a shop.
    fn endpoint(&self, shop: &ShopDomain, path: &str) -> String {
        format!(
            "{}/admin/api/{}/{}",
            shop.origin(),
            self.inner.api_version,
            path
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        session: &ShopSession,
        path: &str,
        resource: &str,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(&session.shop, path))
            .header(ACCESS_TOKEN_HEADER, session.access_token.expose_secret())
            .send()
            .await?;

        read_response(response, resource).await
    }

    async fn post<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        session: &ShopSession,
        path: &str,
        resource: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(&session.shop, path))
            .header(ACCESS_TOKEN_HEADER, session.access_token.expose_secret())
            .json(body)
            .send()
            .await?;

        read_response(response, resource).await
    }
}

#[async_trait]
impl ShopifyApi for RestClient {
    #[instrument(skip(self, code), fields(shop = %shop))]
    async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ShopifyError> {
        let (client_id, client_secret) = self
            .inner
            .credentials
            .as_ref()
            .ok_or_else(|| ShopifyError::OAuth("app credentials not configured".to_string()))?;

        let url = format!("{}/admin/oauth/access_token", shop.origin());
        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed: {}",
                error_message(&text)
            )));
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self, session), fields(shop = %session.shop))]
    async fn product_count(&self, session: &ShopSession) -> Result<ProductCount, ShopifyError> {
        self.get(session, "products/count.json", "products").await
    }

    #[instrument(skip(self, session), fields(shop = %session.shop, product_id = %id))]
    async fn get_product(
        &self,
        session: &ShopSession,
        id: ProductId,
    ) -> Result<Product, ShopifyError> {
        let envelope: ProductEnvelope<Product> = self
            .get(
                session,
                &format!("products/{id}.json"),
                &format!("product {id}"),
            )
            .await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self, session, product), fields(shop = %session.shop, title = %product.title))]
    async fn create_product(
        &self,
        session: &ShopSession,
        product: &NewProduct,
    ) -> Result<Product, ShopifyError> {
        let envelope: ProductEnvelope<Product> = self
            .post(
                session,
                "products.json",
                "products",
                &ProductEnvelope { product },
            )
            .await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self, session, checkout), fields(shop = %session.shop))]
    async fn create_checkout(
        &self,
        session: &ShopSession,
        checkout: &NewCheckout,
    ) -> Result<Checkout, ShopifyError> {
        let envelope: CheckoutEnvelope<Checkout> = self
            .post(
                session,
                "checkouts.json",
                "checkouts",
                &CheckoutEnvelope { checkout },
            )
            .await?;
        Ok(envelope.checkout)
    }
}

/// Map a REST response to a typed body or a [`ShopifyError`].
async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &str,
) -> Result<T, ShopifyError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ShopifyError::RateLimited(retry_after));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ShopifyError::NotFound(resource.to_string()));
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized(message));
        }
        return Err(ShopifyError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Shopify sends `Retry-After` as fractional seconds (`"2.0"`).
fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().split('.').next()?.parse().ok()
}

/// Flatten Shopify's `errors` field (string, list or field map) into one line.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().chars().take(200).collect();
    };

    let errors = value.get("errors").or_else(|| value.get("error"));
    match errors {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => join_values(items),
        Some(serde_json::Value::Object(fields)) => fields
            .iter()
            .map(|(field, messages)| match messages {
                serde_json::Value::Array(items) => format!("{field}: {}", join_values(items)),
                other => format!("{field}: {}", value_text(other)),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => value_text(other),
        None => body.trim().chars().take(200).collect(),
    }
}

fn join_values(items: &[serde_json::Value]) -> String {
    items.iter().map(value_text).collect::<Vec<_>>().join(", ")
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
