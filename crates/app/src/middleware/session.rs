//! Cookie session configuration.
//!
//! The cookie session only carries OAuth handshake state and the shop a
//! browser last authenticated as. Shop access tokens live in
//! [`crate::session::SessionStorage`], never in the cookie store.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::{Expiry as SessionExpiry, SessionManagerLayer, SessionStore, session_store};

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "giftlink_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Most cookie sessions held at once; least recently used are evicted first.
const MAX_SESSIONS: u64 = 100_000;

/// Keys stored in the cookie session.
pub mod session_keys {
    /// OAuth `state` nonce issued by the begin route.
    pub const OAUTH_STATE: &str = "oauth_state";
    /// Shop the OAuth flow was started for.
    pub const OAUTH_SHOP: &str = "oauth_shop";
    /// Shop the browser completed OAuth for.
    pub const SHOP: &str = "shop";
}

/// In-memory cookie session store that drops records once they expire.
///
/// Abandoned OAuth handshakes leave a record behind, so the store must
/// evict on its own rather than wait for a `delete`.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    cache: Cache<Id, Record>,
}

impl CookieSessionStore {
    /// Create a store holding at most `max_sessions` records.
    #[must_use]
    pub fn new(max_sessions: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_sessions)
                .expire_after(RecordExpiry)
                .build(),
        }
    }
}

impl Default for CookieSessionStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.cache.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(session_id).await;
        Ok(())
    }
}

/// Expires each cache entry at its record's `expiry_date`.
struct RecordExpiry;

impl RecordExpiry {
    fn remaining(record: &Record) -> Duration {
        Duration::try_from(record.expiry_date - OffsetDateTime::now_utc())
            .unwrap_or(Duration::ZERO)
    }
}

impl Expiry<Id, Record> for RecordExpiry {
    fn expire_after_create(
        &self,
        _id: &Id,
        record: &Record,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _updated_at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }
}

/// Create the session layer with an in-memory store.
///
/// `SameSite=Lax` so the cookie survives the top-level redirect back from
/// Shopify's authorize screen.
#[must_use]
pub fn create_session_layer(config: &AppConfig) -> SessionManagerLayer<CookieSessionStore> {
    let is_secure = config.shopify.app_url.starts_with("https://");

    SessionManagerLayer::new(CookieSessionStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(SessionExpiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    fn record(expires_in: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_create_load_delete() {
        let store = CookieSessionStore::default();
        let mut live = record(TimeDuration::minutes(30));
        store.create(&mut live).await.unwrap();

        assert_eq!(store.load(&live.id).await.unwrap().unwrap().id, live.id);

        store.delete(&live.id).await.unwrap();
        assert!(store.load(&live.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_not_loaded() {
        let store = CookieSessionStore::default();
        let mut stale = record(TimeDuration::seconds(-1));
        store.create(&mut stale).await.unwrap();

        assert!(store.load(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_records_are_evicted() {
        let store = CookieSessionStore::default();
        for _ in 0..3 {
            store
                .create(&mut record(TimeDuration::seconds(-1)))
                .await
                .unwrap();
        }
        let mut live = record(TimeDuration::minutes(30));
        store.create(&mut live).await.unwrap();

        store.cache.run_pending_tasks().await;
        assert_eq!(store.cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_capacity_bounds_store() {
        let store = CookieSessionStore::new(10);
        for _ in 0..50 {
            store
                .create(&mut record(TimeDuration::minutes(30)))
                .await
                .unwrap();
        }

        store.cache.run_pending_tasks().await;
        assert!(store.cache.entry_count() <= 10);
    }
}
