//! Gift links: resolve a product variant and open a checkout for it.

use giftlink_core::{ProductId, VariantId};
use thiserror::Error;
use tracing::instrument;

use crate::session::ShopSession;
use crate::shopify::{Checkout, NewCheckout, Product, ShopifyApi, ShopifyError, Variant};

/// Errors from gift link operations.
#[derive(Debug, Error)]
pub enum GiftError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("variant {variant_id} not found on product {product_id}")]
    VariantNotFound {
        product_id: ProductId,
        variant_id: VariantId,
    },

    #[error("checkout {0} has no web URL")]
    MissingCheckoutUrl(String),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

impl GiftError {
    /// Whether the product or variant doesn't exist, as opposed to a failed call.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound(_) | Self::VariantNotFound { .. }
        )
    }

    /// Message safe to return to API clients.
    ///
    /// Upstream error text stays in the logs.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::ProductNotFound(_) => "product not found",
            Self::VariantNotFound { .. } => "variant not found",
            Self::MissingCheckoutUrl(_) => "checkout has no URL",
            Self::Shopify(ShopifyError::RateLimited(_)) => "rate limited by Shopify, try again",
            Self::Shopify(_) => "Shopify request failed",
        }
    }
}

/// A product together with one of its variants.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub product: Product,
    pub variant: Variant,
}

/// Fetch a product and pick out one of its variants.
///
/// # Errors
///
/// `ProductNotFound` if Shopify has no such product, `VariantNotFound` if
/// the product has no such variant, `Shopify` for any other failure.
#[instrument(skip(api, session), fields(shop = %session.shop))]
pub async fn get_product_variant(
    api: &dyn ShopifyApi,
    session: &ShopSession,
    product_id: ProductId,
    variant_id: VariantId,
) -> Result<ProductVariant, GiftError> {
    let product = api
        .get_product(session, product_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                GiftError::ProductNotFound(product_id)
            } else {
                GiftError::Shopify(e)
            }
        })?;

    let variant = product
        .variant(variant_id)
        .cloned()
        .ok_or(GiftError::VariantNotFound {
            product_id,
            variant_id,
        })?;

    Ok(ProductVariant { product, variant })
}

/// Create a checkout for one unit of a variant.
///
/// # Errors
///
/// `MissingCheckoutUrl` if Shopify returns a checkout without `web_url`,
/// `Shopify` if the call fails.
#[instrument(skip(api, session), fields(shop = %session.shop))]
pub async fn create_checkout(
    api: &dyn ShopifyApi,
    session: &ShopSession,
    variant_id: VariantId,
) -> Result<Checkout, GiftError> {
    let checkout = api
        .create_checkout(session, &NewCheckout::single(variant_id))
        .await?;

    if checkout.web_url.as_deref().is_none_or(str::is_empty) {
        return Err(GiftError::MissingCheckoutUrl(checkout.token));
    }

    Ok(checkout)
}

/// Resolve a variant and return the URL of a fresh checkout for it.
///
/// # Errors
///
/// See [`get_product_variant`] and [`create_checkout`].
pub async fn gift_checkout_url(
    api: &dyn ShopifyApi,
    session: &ShopSession,
    product_id: ProductId,
    variant_id: VariantId,
) -> Result<String, GiftError> {
    let ProductVariant { variant, .. } =
        get_product_variant(api, session, product_id, variant_id).await?;
    let checkout = create_checkout(api, session, variant.id).await?;

    checkout
        .web_url
        .ok_or(GiftError::MissingCheckoutUrl(checkout.token))
}
