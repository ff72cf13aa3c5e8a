//! The Postgres-backed [`RecordStore`] used in production wiring.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use aivis_core::AIVisibilityScore;
use aivis_orchestrator::{AnswerBundle, JobCounters, RecordStore, StoreError};

use crate::{answers, runs, DbError};

/// Record store over a shared connection pool.
///
/// Connection-level failures map to [`StoreError::Unavailable`] so the
/// orchestrator fails a job fast instead of retrying every remaining
/// prompt against a dead store; everything else is a per-prompt
/// [`StoreError::Write`].
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(error: DbError) -> StoreError {
    match &error {
        DbError::Sqlx(sqlx_err) if is_systemic(sqlx_err) => {
            StoreError::Unavailable(error.to_string())
        }
        _ => StoreError::Write(error.to_string()),
    }
}

fn is_systemic(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn persist_answer_bundle(&self, bundle: &AnswerBundle) -> Result<(), StoreError> {
        answers::insert_answer_bundle(&self.pool, bundle)
            .await
            .map_err(map_db_error)
    }

    async fn create_run(&self, run_id: Uuid, kind: &str) -> Result<(), StoreError> {
        runs::create_collection_run(&self.pool, run_id, kind)
            .await
            .map_err(map_db_error)
    }

    async fn start_run(&self, run_id: Uuid) -> Result<(), StoreError> {
        runs::start_collection_run(&self.pool, run_id)
            .await
            .map_err(map_db_error)
    }

    async fn complete_run(
        &self,
        run_id: Uuid,
        counters: &JobCounters,
        errors: &[String],
    ) -> Result<(), StoreError> {
        runs::complete_collection_run(&self.pool, run_id, counters, errors)
            .await
            .map_err(map_db_error)
    }

    async fn fail_run(
        &self,
        run_id: Uuid,
        error: &str,
        counters: &JobCounters,
    ) -> Result<(), StoreError> {
        runs::fail_collection_run(&self.pool, run_id, error, counters)
            .await
            .map_err(map_db_error)
    }

    async fn scores_in_window(
        &self,
        brand_id: Option<&str>,
        window_days: u32,
    ) -> Result<Vec<AIVisibilityScore>, StoreError> {
        crate::scores::list_scores_in_window(&self.pool, brand_id, window_days)
            .await
            .map_err(map_db_error)
    }
}
