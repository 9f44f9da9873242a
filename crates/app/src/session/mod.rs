//! Shop sessions created by OAuth and the storage that holds them.
//!
//! A session is the access token a shop granted the app, plus the scopes
//! it was granted for. Sessions are "offline" (not tied to a staff member),
//! so there is exactly one per shop, keyed by `offline_{shop}`.

mod scopes;
mod storage;

pub use scopes::Scopes;
pub use storage::{MemorySessionStorage, SessionStorage, SessionStorageError};

use giftlink_core::ShopDomain;
use secrecy::{ExposeSecret, SecretString};

/// An authenticated shop session.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Storage key (`offline_{shop}`).
    pub id: String,
    /// Shop the token belongs to.
    pub shop: ShopDomain,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// Scopes granted at install time.
    pub scope: Scopes,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

impl ShopSession {
    /// Create an offline session for a shop.
    #[must_use]
    pub fn offline(shop: ShopDomain, access_token: SecretString, scope: Scopes) -> Self {
        Self {
            id: Self::offline_id(&shop),
            shop,
            access_token,
            scope,
        }
    }

    /// Storage key of a shop's offline session.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{shop}")
    }

    /// Whether the session can serve API calls needing `required` scopes.
    #[must_use]
    pub fn is_active(&self, required: &Scopes) -> bool {
        !self.access_token.expose_secret().is_empty() && self.scope.covers(required)
    }
}
