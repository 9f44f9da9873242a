//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::session::{MemorySessionStorage, SessionStorage};
use crate::shopify::{RestClient, ShopifyApi};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Built once at startup and
/// read-only afterwards; session storage handles its own locking.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    shopify: Arc<dyn ShopifyApi>,
    sessions: Arc<dyn SessionStorage>,
}

impl AppState {
    /// Create state backed by the REST client and in-memory session storage.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let shopify = Arc::new(RestClient::new(&config.shopify));
        Self::with_services(config, shopify, Arc::new(MemorySessionStorage::new()))
    }

    /// Create state with explicit Shopify and session storage implementations.
    #[must_use]
    pub fn with_services(
        config: AppConfig,
        shopify: Arc<dyn ShopifyApi>,
        sessions: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                sessions,
            }),
        }
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify API client.
    #[must_use]
    pub fn shopify(&self) -> &dyn ShopifyApi {
        self.inner.shopify.as_ref()
    }

    /// Get a reference to the shop session storage.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStorage {
        self.inner.sessions.as_ref()
    }
}
