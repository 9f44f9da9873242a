//! Business logic services.
//!
//! # Services
//!
//! - `gift` - Variant lookup and checkout creation for gift links
//! - `seeder` - Sample product creation for development stores

pub mod gift;
pub mod seeder;

pub use gift::{GiftError, ProductVariant, create_checkout, get_product_variant, gift_checkout_url};
pub use seeder::{DEFAULT_PRODUCTS_COUNT, SeedError, SeedReport, create_sample_products};
