//! Giftlink Core - Shared types library.
//!
//! This crate provides common types used across all Giftlink components:
//! - `app` - Embedded app backend (OAuth, API routes, SPA hosting)
//! - `cli` - Command-line tools for operating against a shop
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for shop domains, resource IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
