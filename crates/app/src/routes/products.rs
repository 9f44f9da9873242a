//! Product route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::CurrentSession;
use crate::services::{DEFAULT_PRODUCTS_COUNT, create_sample_products};
use crate::shopify::ProductCount;
use crate::state::AppState;

/// `/api/products/create` body.
#[derive(Debug, Serialize)]
pub struct CreateProductsResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// GET /api/products/count - The shop's product count, as Shopify reports it.
#[instrument(skip(state, session))]
pub async fn count(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ProductCount>, AppError> {
    let count = state.shopify().product_count(&session).await?;
    Ok(Json(count))
}

/// GET /api/products/create - Seed the shop with sample products.
#[instrument(skip(state, session))]
pub async fn create(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    match create_sample_products(state.shopify(), &session, DEFAULT_PRODUCTS_COUNT).await {
        Ok(_) => Json(CreateProductsResponse {
            success: true,
            error: None,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to process products/create");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CreateProductsResponse {
                    success: false,
                    error: Some(e.public_message()),
                }),
            )
                .into_response()
        }
    }
}
