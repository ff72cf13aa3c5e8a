use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aivis_orchestrator::{CollectionJob, JobCounters, JobKind, JobScope, JobStatus};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize, Default)]
pub(super) struct TriggerJobRequest {
    pub brand_id: Option<String>,
    pub prompt_ids: Option<Vec<String>>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TriggeredJob {
    job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub(super) struct JobStatusItem {
    job_id: Uuid,
    kind: JobKind,
    status: JobStatus,
    progress: u8,
    counters: JobCounters,
    errors: Vec<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<CollectionJob> for JobStatusItem {
    fn from(job: CollectionJob) -> Self {
        Self {
            job_id: job.id,
            kind: job.kind,
            status: job.status,
            progress: job.progress,
            counters: job.counters,
            errors: job.errors,
            error: job.error,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

pub(super) async fn trigger_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<TriggerJobRequest>>,
) -> Result<Json<ApiResponse<TriggeredJob>>, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let scope = JobScope {
        brand_id: request.brand_id,
        prompt_ids: request.prompt_ids,
        locale: request.locale,
    };

    let job_id = state
        .orchestrator
        .trigger_once(JobKind::Triggered, scope)
        .await;

    Ok(Json(ApiResponse {
        data: TriggeredJob { job_id },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusItem>>, ApiError> {
    let Some(job) = state.orchestrator.job_status(job_id).await else {
        return Err(ApiError::new(req_id.0, "not_found", "job not found"));
    };

    Ok(Json(ApiResponse {
        data: JobStatusItem::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn cancel_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusItem>>, ApiError> {
    if !state.orchestrator.cancel_job(job_id).await {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "job not found or already finished",
        ));
    }
    let Some(job) = state.orchestrator.job_status(job_id).await else {
        return Err(ApiError::new(req_id.0, "not_found", "job not found"));
    };

    Ok(Json(ApiResponse {
        data: JobStatusItem::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_item_is_serializable() {
        let job = CollectionJob::new(JobKind::Triggered, JobScope::default());
        let item = JobStatusItem::from(job);
        let json = serde_json::to_string(&item).expect("serialize job status");
        assert!(json.contains("\"status\":\"queued\""));
        assert!(json.contains("\"progress\":0"));
    }

    #[test]
    fn trigger_request_deserializes_with_all_fields_optional() {
        let request: TriggerJobRequest = serde_json::from_str("{}").unwrap();
        assert!(request.brand_id.is_none());

        let request: TriggerJobRequest =
            serde_json::from_str("{\"brand_id\":\"acme\",\"locale\":\"en\"}").unwrap();
        assert_eq!(request.brand_id.as_deref(), Some("acme"));
        assert_eq!(request.locale.as_deref(), Some("en"));
    }
}
