//! Core types for Giftlink.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod shop;

pub use id::{IdError, ProductId, VariantId};
pub use price::Price;
pub use shop::{ShopDomain, ShopDomainError};
