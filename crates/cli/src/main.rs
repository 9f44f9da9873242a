//! Giftlink CLI - Store management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create 5 sample products in a development store
//! SHOPIFY_ACCESS_TOKEN=shpat_... giftlink-cli seed --shop acme.myshopify.com
//!
//! # Create 20
//! giftlink-cli seed --shop acme.myshopify.com --count 20
//!
//! # Print the store's product count
//! giftlink-cli count --shop acme.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `seed` - Create sample products
//! - `count` - Print the product count

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use giftlink_app::services::DEFAULT_PRODUCTS_COUNT;
use giftlink_core::ShopDomain;
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "giftlink-cli")]
#[command(author, version, about = "Giftlink CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create sample products with random titles and prices
    Seed {
        /// Shop domain (e.g. acme.myshopify.com)
        #[arg(short, long, value_parser = parse_shop)]
        shop: ShopDomain,

        /// Number of products to create
        #[arg(short, long, default_value_t = DEFAULT_PRODUCTS_COUNT)]
        count: usize,
    },
    /// Print the shop's product count
    Count {
        /// Shop domain (e.g. acme.myshopify.com)
        #[arg(short, long, value_parser = parse_shop)]
        shop: ShopDomain,
    },
}

/// Log filter from `RUST_LOG`, defaulting to `info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn parse_shop(s: &str) -> Result<ShopDomain, String> {
    ShopDomain::parse(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    // Command output goes through tracing, so info must be on by default
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { shop, count } => commands::seed::products(shop, count).await?,
        Commands::Count { shop } => commands::count::products(shop).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_defaults() {
        let cli = Cli::try_parse_from(["giftlink-cli", "seed", "--shop", "acme.myshopify.com"])
            .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Seed { shop, count } = cli.command else {
            panic!("expected seed");
        };
        assert_eq!(shop.as_str(), "acme.myshopify.com");
        assert_eq!(count, DEFAULT_PRODUCTS_COUNT);
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        use tracing_subscriber::filter::LevelFilter;

        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_rejects_invalid_shop() {
        assert!(Cli::try_parse_from(["giftlink-cli", "count", "--shop", "example.com"]).is_err());
    }
}
