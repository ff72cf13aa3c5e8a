use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct IndexQuery {
    pub brand_id: Option<String>,
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct VisibilityIndexItem {
    index: u32,
    brand_id: Option<String>,
    window_days: u32,
    score_count: usize,
}

pub(super) async fn get_index(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<ApiResponse<VisibilityIndexItem>>, ApiError> {
    let window_days = query.window_days.unwrap_or(state.config.index_window_days);
    if window_days == 0 || window_days > 365 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "window_days must be between 1 and 365",
        ));
    }

    let scores =
        aivis_db::list_scores_in_window(&state.pool, query.brand_id.as_deref(), window_days)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let index = aivis_scorer::visibility_index(&scores, window_days);

    Ok(Json(ApiResponse {
        data: VisibilityIndexItem {
            index,
            brand_id: query.brand_id,
            window_days,
            score_count: scores.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
