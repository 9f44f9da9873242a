//! REST Admin API resource types.
//!
//! Only the fields the app reads or writes are modelled; unknown fields are
//! ignored on deserialization.

use giftlink_core::{Price, ProductId, VariantId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Products
// =============================================================================

/// A product returned by the REST Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// URL handle.
    #[serde(default)]
    pub handle: Option<String>,
    /// `active`, `draft` or `archived`.
    #[serde(default)]
    pub status: Option<String>,
    /// Vendor name.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Product type/category.
    #[serde(default)]
    pub product_type: Option<String>,
    /// Product variants.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Find a variant of this product by ID.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }
}

/// A product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant ID.
    pub id: VariantId,
    /// Owning product.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Variant title (combination of option values).
    #[serde(default)]
    pub title: String,
    /// Current price.
    pub price: Price,
    /// SKU code.
    #[serde(default)]
    pub sku: Option<String>,
    /// Inventory quantity across all locations.
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    /// `deny` or `continue` when out of stock.
    #[serde(default)]
    pub inventory_policy: Option<String>,
}

/// Response of `GET /products/count.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCount {
    pub count: u64,
}

/// Input for `POST /products.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<NewVariant>,
}

/// Variant input nested in [`NewProduct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVariant {
    pub price: Price,
}

// =============================================================================
// Checkouts
// =============================================================================

/// Input for `POST /checkouts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCheckout {
    pub line_items: Vec<CheckoutLineItem>,
}

impl NewCheckout {
    /// A checkout for a single unit of one variant.
    #[must_use]
    pub fn single(variant_id: VariantId) -> Self {
        Self {
            line_items: vec![CheckoutLineItem {
                variant_id,
                quantity: 1,
            }],
        }
    }
}

/// A checkout line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutLineItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A checkout returned by the REST Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    /// Checkout token (its REST identifier).
    pub token: String,
    /// Customer-facing checkout URL.
    #[serde(default)]
    pub web_url: Option<String>,
    /// Total price including taxes and shipping.
    #[serde(default)]
    pub total_price: Option<Price>,
    /// Currency of the totals.
    #[serde(default)]
    pub currency: Option<String>,
}

// =============================================================================
// OAuth
// =============================================================================

/// Access token returned by the OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub scope: String,
}

// =============================================================================
// Envelopes
// =============================================================================

/// `{"product": {...}}` request/response body.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProductEnvelope<T> {
    pub product: T,
}

/// `{"checkout": {...}}` request/response body.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CheckoutEnvelope<T> {
    pub checkout: T,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_rest_payload() {
        let json = r#"{
            "product": {
                "id": 632910392,
                "title": "IPod Nano - 8GB",
                "body_html": "<p>It's the small iPod</p>",
                "vendor": "Apple",
                "product_type": "Cult Products",
                "handle": "ipod-nano",
                "status": "active",
                "variants": [
                    {
                        "id": 808950810,
                        "product_id": 632910392,
                        "title": "Pink",
                        "price": "199.00",
                        "sku": "IPOD2008PINK",
                        "inventory_policy": "continue",
                        "inventory_quantity": 10
                    }
                ]
            }
        }"#;

        let envelope: ProductEnvelope<Product> = serde_json::from_str(json).unwrap();
        let product = envelope.product;
        assert_eq!(product.id, ProductId::new(632_910_392));
        assert_eq!(product.vendor.as_deref(), Some("Apple"));

        let variant = product.variant(VariantId::new(808_950_810)).unwrap();
        assert_eq!(variant.price, Price::from_cents(19_900));
        assert_eq!(variant.inventory_quantity, Some(10));
        assert!(product.variant(VariantId::new(1)).is_none());
    }

    #[test]
    fn test_new_product_body() {
        let body = ProductEnvelope {
            product: NewProduct {
                title: "misty river".to_string(),
                variants: vec![NewVariant {
                    price: Price::from_cents(412),
                }],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "product": {
                    "title": "misty river",
                    "variants": [{ "price": "4.12" }]
                }
            })
        );
    }

    #[test]
    fn test_new_checkout_body() {
        let body = CheckoutEnvelope {
            checkout: NewCheckout::single(VariantId::new(39_072_856)),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "checkout": {
                    "line_items": [{ "variant_id": 39_072_856, "quantity": 1 }]
                }
            })
        );
    }

    #[test]
    fn test_checkout_deserializes_without_optional_fields() {
        let json = r#"{"checkout": {"token": "b490a9220cd14d7344024f4874f640a6", "web_url": "https://acme.myshopify.com/1/checkouts/b490"}}"#;
        let envelope: CheckoutEnvelope<Checkout> = serde_json::from_str(json).unwrap();
        assert_eq!(
            envelope.checkout.web_url.as_deref(),
            Some("https://acme.myshopify.com/1/checkouts/b490")
        );
        assert!(envelope.checkout.total_price.is_none());
    }
}
