use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BrandItem {
    id: String,
    name: String,
    aliases: Vec<String>,
    negative_terms: Vec<String>,
    owned_domain: Option<String>,
    locale: String,
}

pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandItem>>>, ApiError> {
    let brands_file = aivis_core::load_brands(&state.config.brands_path).map_err(|e| {
        tracing::error!(error = %e, "failed to load brands file");
        ApiError::new(req_id.0.clone(), "internal_error", "brand config unreadable")
    })?;

    let data = brands_file
        .brands
        .into_iter()
        .map(|brand| BrandItem {
            id: brand.slug(),
            name: brand.name,
            aliases: brand.aliases,
            negative_terms: brand.negative_terms,
            owned_domain: brand.owned_domain,
            locale: brand.locale,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
