//! Gift link route handler.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use giftlink_core::{IdError, ProductId, VariantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::middleware::CurrentSession;
use crate::services::gift_checkout_url;
use crate::state::AppState;

/// Raw `/api/gift` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct GiftQuery {
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
}

/// Validated gift request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
}

/// Why a [`GiftQuery`] was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GiftRequestError {
    #[error("product_id and variant_id is required")]
    Missing,
    #[error("invalid product_id: {0}")]
    InvalidProduct(IdError),
    #[error("invalid variant_id: {0}")]
    InvalidVariant(IdError),
}

impl TryFrom<GiftQuery> for GiftRequest {
    type Error = GiftRequestError;

    fn try_from(query: GiftQuery) -> Result<Self, Self::Error> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (Some(product_id), Some(variant_id)) =
            (present(query.product_id), present(query.variant_id))
        else {
            return Err(GiftRequestError::Missing);
        };

        Ok(Self {
            product_id: ProductId::parse(&product_id).map_err(GiftRequestError::InvalidProduct)?,
            variant_id: VariantId::parse(&variant_id).map_err(GiftRequestError::InvalidVariant)?,
        })
    }
}

/// Successful `/api/gift` body.
#[derive(Debug, Serialize)]
pub struct GiftResponse {
    pub checkout_url: String,
}

/// Failed `/api/gift` body.
#[derive(Debug, Serialize)]
pub struct GiftErrorResponse {
    pub error: &'static str,
}

/// GET /api/gift - Create a checkout for one unit of a product variant.
#[instrument(skip(state, session))]
pub async fn gift(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<GiftQuery>,
) -> Response {
    let request = match GiftRequest::try_from(query) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match gift_checkout_url(
        state.shopify(),
        &session,
        request.product_id,
        request.variant_id,
    )
    .await
    {
        Ok(checkout_url) => Json(GiftResponse { checkout_url }).into_response(),
        Err(e) => {
            tracing::error!(
                error = %e,
                product_id = %request.product_id,
                variant_id = %request.variant_id,
                "Failed to create gift checkout"
            );
            (
                StatusCode::BAD_REQUEST,
                Json(GiftErrorResponse {
                    error: e.public_message(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(product_id: Option<&str>, variant_id: Option<&str>) -> GiftQuery {
        GiftQuery {
            product_id: product_id.map(String::from),
            variant_id: variant_id.map(String::from),
        }
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(
            GiftRequest::try_from(query(Some("10"), Some("gid://shopify/ProductVariant/100"))),
            Ok(GiftRequest {
                product_id: ProductId::new(10),
                variant_id: VariantId::new(100),
            })
        );
    }

    #[test]
    fn test_missing_params() {
        assert_eq!(
            GiftRequest::try_from(query(None, Some("100"))),
            Err(GiftRequestError::Missing)
        );
        assert_eq!(
            GiftRequest::try_from(query(Some("10"), None)),
            Err(GiftRequestError::Missing)
        );
        assert_eq!(
            GiftRequest::try_from(query(Some(""), Some("  "))),
            Err(GiftRequestError::Missing)
        );
        assert_eq!(
            GiftRequestError::Missing.to_string(),
            "product_id and variant_id is required"
        );
    }

    #[test]
    fn test_malformed_params() {
        assert!(matches!(
            GiftRequest::try_from(query(Some("abc"), Some("100"))),
            Err(GiftRequestError::InvalidProduct(_))
        ));
        assert!(matches!(
            GiftRequest::try_from(query(Some("10"), Some("gid://shopify/Product/100"))),
            Err(GiftRequestError::InvalidVariant(IdError::WrongResource { .. }))
        ));
    }
}
