//! Session storage.
//!
//! The app only needs get/put by id. The in-memory implementation is
//! the default; sessions are lost on restart and shops re-run OAuth.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::ShopSession;

/// Errors returned by session storage backends.
#[derive(Debug, Error)]
pub enum SessionStorageError {
    /// The backend could not be reached or failed the operation.
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage for shop sessions.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Insert or replace a session.
    async fn store_session(&self, session: ShopSession) -> Result<(), SessionStorageError>;

    /// Load a session by id.
    async fn load_session(&self, id: &str) -> Result<Option<ShopSession>, SessionStorageError>;
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    sessions: RwLock<HashMap<String, ShopSession>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn store_session(&self, session: ShopSession) -> Result<(), SessionStorageError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn load_session(&self, id: &str) -> Result<Option<ShopSession>, SessionStorageError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use giftlink_core::ShopDomain;
    use secrecy::{ExposeSecret, SecretString};

    use super::*;
    use crate::session::Scopes;

    fn session(token: &str) -> ShopSession {
        ShopSession::offline(
            ShopDomain::parse("acme.myshopify.com").unwrap(),
            SecretString::from(token),
            Scopes::parse("write_products"),
        )
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let storage = MemorySessionStorage::new();
        storage.store_session(session("shpat_1")).await.unwrap();

        let loaded = storage
            .load_session("offline_acme.myshopify.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "shpat_1");
    }

    #[tokio::test]
    async fn test_store_replaces_existing() {
        let storage = MemorySessionStorage::new();
        storage.store_session(session("shpat_1")).await.unwrap();
        storage.store_session(session("shpat_2")).await.unwrap();

        let loaded = storage
            .load_session("offline_acme.myshopify.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "shpat_2");
    }

    #[tokio::test]
    async fn test_load_missing() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load_session("offline_nope").await.unwrap().is_none());
    }
}
