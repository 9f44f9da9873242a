//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # OAuth (unauthenticated)
//! GET  /api/auth               - Begin OAuth
//! GET  /api/auth/callback      - Complete OAuth, redirect into the app
//!
//! # API (shop session required)
//! GET  /api/gift               - Checkout URL for a product variant
//! GET  /api/products/count     - Product count
//! GET  /api/products/create    - Seed sample products
//! *    /api/*                  - 404 JSON
//!
//! # Frontend
//! GET  /<file>                 - Static file from the frontend directory
//! GET  /*                      - SPA shell (installed shops only)
//! ```

pub mod auth;
pub mod frontend;
pub mod gift;
pub mod products;

use axum::{
    Json, Router,
    http::{Request, Response, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    create_session_layer, ensure_installed_on_shop, frame_ancestors_middleware,
    request_id_middleware, validate_authenticated_session,
};
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let shopify = &config.shopify;

    let api = Router::new()
        .route("/gift", get(gift::gift))
        .route("/products/count", get(products::count))
        .route("/products/create", get(products::create))
        .fallback(api_not_found)
        .layer(from_fn_with_state(
            state.clone(),
            validate_authenticated_session,
        ));

    let spa = Router::new()
        .fallback(frontend::index)
        .layer(from_fn_with_state(state.clone(), ensure_installed_on_shop))
        .with_state(state.clone());

    // Directories never resolve to index.html; they fall through to the guarded SPA shell
    let static_files = ServeDir::new(&config.static_path)
        .append_index_html_on_directories(false)
        .fallback(spa);

    Router::new()
        .route("/health", get(health))
        .route(&shopify.auth_path, get(auth::begin))
        .route(&shopify.callback_path, get(auth::callback))
        .nest("/api", api)
        .fallback_service(static_files)
        .layer(from_fn_with_state(state.clone(), frame_ancestors_middleware))
        .layer(create_session_layer(config))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        shop = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Unknown authenticated API path.
async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
