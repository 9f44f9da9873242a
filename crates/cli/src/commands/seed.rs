//! Seed a store with sample products.

use giftlink_app::services::create_sample_products;
use giftlink_core::ShopDomain;
use tracing::info;

/// Create `count` sample products in `shop`.
///
/// # Errors
///
/// Returns an error if `SHOPIFY_ACCESS_TOKEN` is not set or any product
/// fails to be created.
pub async fn products(shop: ShopDomain, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let (client, session) = super::shop_client(shop)?;

    info!(shop = %session.shop, count, "Creating sample products");
    let report = create_sample_products(&client, &session, count).await?;

    info!(
        attempted = report.attempted,
        created = report.created,
        "Seeding complete"
    );
    Ok(())
}
