//! Report a store's product count.

use giftlink_app::shopify::ShopifyApi;
use giftlink_core::ShopDomain;
use tracing::info;

/// Log the number of products in `shop`.
///
/// # Errors
///
/// Returns an error if `SHOPIFY_ACCESS_TOKEN` is not set or the request fails.
pub async fn products(shop: ShopDomain) -> Result<(), Box<dyn std::error::Error>> {
    let (client, session) = super::shop_client(shop)?;

    let count = client.product_count(&session).await?;
    info!(shop = %session.shop, count = count.count, "Product count");
    Ok(())
}
