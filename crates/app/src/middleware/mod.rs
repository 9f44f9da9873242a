//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. Frame ancestors CSP
//!
//! Route-level:
//! - [`validate_authenticated_session`] guards everything under `/api`
//!   except the OAuth routes
//! - [`ensure_installed_on_shop`] guards the SPA fallback

pub mod auth;
pub mod csp;
pub mod installed;
pub mod request_id;
pub mod session;

pub use auth::{CurrentSession, validate_authenticated_session};
pub use csp::frame_ancestors_middleware;
pub use installed::ensure_installed_on_shop;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
