//! Giftlink app library.
//!
//! Backend for an embedded Shopify app that turns a product variant into a
//! checkout link. Exposed as a library so the router can be driven
//! in-process by tests and the CLI can reuse the Shopify client and seeder.
//!
//! # Security
//!
//! This crate holds shop access tokens (Admin API, HIGH PRIVILEGE) and the
//! app client secret. Both are kept in `SecretString` and redacted from
//! `Debug` output.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod shopify;
pub mod state;
