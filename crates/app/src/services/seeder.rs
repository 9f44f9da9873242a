//! Sample product seeding.
//!
//! Creates a batch of products with random two-word titles and a single
//! variant priced under ten dollars, so a development store has something
//! to gift.

use giftlink_core::Price;
use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::instrument;

use crate::session::ShopSession;
use crate::shopify::{NewProduct, NewVariant, ShopifyApi, ShopifyError};

/// Products created by one seeding run unless told otherwise.
pub const DEFAULT_PRODUCTS_COUNT: usize = 5;

/// Highest sample price, in cents.
const MAX_PRICE_CENTS: i64 = 1_000;

const ADJECTIVES: &[&str] = &[
    "autumn", "hidden", "bitter", "misty", "silent", "empty", "dry", "dark", "summer", "icy",
    "delicate", "quiet", "white", "cool", "spring", "winter", "patient", "twilight", "dawn",
    "crimson", "wispy", "weathered", "blue", "billowing", "broken", "cold", "damp", "falling",
    "frosty", "green", "long", "late", "bold", "little", "morning", "muddy", "old", "red",
    "rough", "still", "small", "sparkling", "shy", "wandering", "withered", "wild", "black",
    "young", "holy", "solitary", "fragrant", "aged", "snowy", "proud", "floral", "restless",
    "divine", "polished", "ancient", "purple", "lively", "nameless",
];

const NOUNS: &[&str] = &[
    "waterfall", "river", "breeze", "moon", "rain", "wind", "sea", "morning", "snow", "lake",
    "sunset", "pine", "shadow", "leaf", "dawn", "glitter", "forest", "hill", "cloud", "meadow",
    "sun", "glade", "bird", "brook", "butterfly", "bush", "dew", "dust", "field", "fire",
    "flower", "firefly", "feather", "grass", "haze", "mountain", "night", "pond", "darkness",
    "snowflake", "silence", "sound", "sky", "shape", "surf", "thunder", "violet", "water",
    "wildflower", "wave", "resonance", "wood", "dream", "cherry", "tree", "fog", "frost",
    "voice", "paper", "frog", "smoke", "star",
];

/// Outcome of a seeding run in which every product was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub attempted: usize,
    pub created: usize,
}

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// One or more products failed; the rest were still attempted.
    #[error("failed to create {failed} of {attempted} products: {first}")]
    Failed {
        attempted: usize,
        failed: usize,
        /// The first failure, for logs.
        first: ShopifyError,
    },
}

impl SeedError {
    /// Message safe to return to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Failed {
                attempted, failed, ..
            } => format!("failed to create {failed} of {attempted} products"),
        }
    }
}

/// A random `"{adjective} {noun}"` title.
pub fn random_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("plain");
    let noun = NOUNS.choose(rng).copied().unwrap_or("thing");
    format!("{adjective} {noun}")
}

/// A random price between 0.00 and 10.00 inclusive.
pub fn random_price<R: Rng + ?Sized>(rng: &mut R) -> Price {
    Price::from_cents(rng.random_range(0..=MAX_PRICE_CENTS))
}

/// A sample product with one variant.
pub fn sample_product<R: Rng + ?Sized>(rng: &mut R) -> NewProduct {
    NewProduct {
        title: random_title(rng),
        variants: vec![NewVariant {
            price: random_price(rng),
        }],
    }
}

/// Create `count` sample products, one at a time.
///
/// A failed product doesn't stop the run; every product is attempted and
/// failures are reported together.
///
/// # Errors
///
/// Returns `SeedError::Failed` if any product could not be created.
#[instrument(skip(api, session), fields(shop = %session.shop))]
pub async fn create_sample_products(
    api: &dyn ShopifyApi,
    session: &ShopSession,
    count: usize,
) -> Result<SeedReport, SeedError> {
    // ThreadRng is !Send, so draw everything before the first await
    let products: Vec<NewProduct> = {
        let mut rng = rand::rng();
        (0..count).map(|_| sample_product(&mut rng)).collect()
    };

    let mut created = 0;
    let mut failures = Vec::new();

    for product in &products {
        match api.create_product(session, product).await {
            Ok(p) => {
                tracing::debug!(product_id = %p.id, title = %p.title, "Created sample product");
                created += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, title = %product.title, "Failed to create sample product");
                failures.push(e);
            }
        }
    }

    let attempted = products.len();
    let failed = failures.len();
    match failures.into_iter().next() {
        None => {
            tracing::info!(created, "Seeded sample products");
            Ok(SeedReport { attempted, created })
        }
        Some(first) => Err(SeedError::Failed {
            attempted,
            failed,
            first,
        }),
    }
}
