//! In-process [`ShopifyApi`] double for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use giftlink_core::{Price, ProductId, ShopDomain, VariantId};

use super::{
    AccessTokenResponse, Checkout, NewCheckout, NewProduct, Product, ProductCount, ShopifyApi,
    ShopifyError, Variant,
};
use crate::session::ShopSession;

#[derive(Default)]
pub struct FakeShopify {
    pub products: HashMap<ProductId, Product>,
    pub count: u64,
    /// Status returned by every `get_product` call, when set.
    pub get_product_status: Option<u16>,
    pub checkout_url: Option<String>,
    /// Zero-based `create_product` calls that fail.
    pub failing_creates: HashSet<usize>,
    pub created: Mutex<Vec<NewProduct>>,
    pub checkouts: Mutex<Vec<NewCheckout>>,
}

impl FakeShopify {
    pub fn with_product(mut self, product_id: u64, variant_ids: &[u64]) -> Self {
        let id = ProductId::new(product_id);
        let variants = variant_ids
            .iter()
            .map(|&v| Variant {
                id: VariantId::new(v),
                product_id: Some(id),
                title: "Default Title".to_string(),
                price: Price::from_cents(1_000),
                sku: None,
                inventory_quantity: Some(3),
                inventory_policy: Some("deny".to_string()),
            })
            .collect();
        self.products.insert(
            id,
            Product {
                id,
                title: format!("Product {product_id}"),
                handle: None,
                status: Some("active".to_string()),
                vendor: None,
                product_type: None,
                variants,
            },
        );
        self
    }

    fn created_count(&self) -> usize {
        self.created.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ShopifyApi for FakeShopify {
    async fn exchange_code(
        &self,
        _shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ShopifyError> {
        Ok(AccessTokenResponse {
            access_token: format!("shpat_{code}"),
            scope: "write_products,write_checkouts".to_string(),
        })
    }

    async fn product_count(&self, _session: &ShopSession) -> Result<ProductCount, ShopifyError> {
        Ok(ProductCount { count: self.count })
    }

    async fn get_product(
        &self,
        _session: &ShopSession,
        id: ProductId,
    ) -> Result<Product, ShopifyError> {
        if let Some(status) = self.get_product_status {
            return Err(ShopifyError::Api {
                status,
                message: "upstream exploded".to_string(),
            });
        }
        self.products
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id}")))
    }

    async fn create_product(
        &self,
        _session: &ShopSession,
        product: &NewProduct,
    ) -> Result<Product, ShopifyError> {
        let call = self.created_count();
        if let Ok(mut created) = self.created.lock() {
            created.push(product.clone());
        }
        if self.failing_creates.contains(&call) {
            return Err(ShopifyError::Api {
                status: 422,
                message: "title: has already been taken".to_string(),
            });
        }
        Ok(Product {
            id: ProductId::new(1_000 + call as u64),
            title: product.title.clone(),
            handle: None,
            status: Some("active".to_string()),
            vendor: None,
            product_type: None,
            variants: Vec::new(),
        })
    }

    async fn create_checkout(
        &self,
        _session: &ShopSession,
        checkout: &NewCheckout,
    ) -> Result<Checkout, ShopifyError> {
        if let Ok(mut checkouts) = self.checkouts.lock() {
            checkouts.push(checkout.clone());
        }
        Ok(Checkout {
            token: "b490a9220cd14d7344024f4874f640a6".to_string(),
            web_url: self.checkout_url.clone(),
            total_price: None,
            currency: None,
        })
    }
}
