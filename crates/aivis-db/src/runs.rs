//! Database operations for the `collection_runs` history table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aivis_orchestrator::JobCounters;

use crate::DbError;

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub prompts_processed: i64,
    pub answers_collected: i64,
    pub mentions_found: i64,
    pub scores_calculated: i64,
    /// Non-fatal per-prompt error strings, stored as a JSON array.
    pub errors: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a new collection run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_run(
    pool: &PgPool,
    public_id: Uuid,
    run_type: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO collection_runs (public_id, run_type, status) \
         VALUES ($1, $2, 'queued')",
    )
    .bind(public_id)
    .bind(run_type)
    .execute(pool)
    .await?;
    Ok(())
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_collection_run(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'running', started_at = NOW() \
         WHERE public_id = $1 AND status = 'queued'",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            public_id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` with final counters and error list.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    public_id: Uuid,
    counters: &JobCounters,
    errors: &[String],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             prompts_processed = $1, answers_collected = $2, \
             mentions_found = $3, scores_calculated = $4, errors = $5 \
         WHERE public_id = $6 AND status = 'running'",
    )
    .bind(to_i64(counters.prompts_processed))
    .bind(to_i64(counters.answers_collected))
    .bind(to_i64(counters.mentions_found))
    .bind(to_i64(counters.scores_calculated))
    .bind(serde_json::to_value(errors)?)
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            public_id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, preserving whatever counters accumulated.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    public_id: Uuid,
    error_message: &str,
    counters: &JobCounters,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1, \
             prompts_processed = $2, answers_collected = $3, \
             mentions_found = $4, scores_calculated = $5 \
         WHERE public_id = $6 AND status = 'running'",
    )
    .bind(error_message)
    .bind(to_i64(counters.prompts_processed))
    .bind(to_i64(counters.answers_collected))
    .bind(to_i64(counters.mentions_found))
    .bind(to_i64(counters.scores_calculated))
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            public_id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its public id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_collection_run(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<CollectionRunRow, DbError> {
    sqlx::query_as::<_, CollectionRunRow>(
        "SELECT id, public_id, run_type, status, started_at, completed_at, \
                prompts_processed, answers_collected, mentions_found, \
                scores_calculated, errors, error_message, created_at \
         FROM collection_runs \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(
        "SELECT id, public_id, run_type, status, started_at, completed_at, \
                prompts_processed, answers_collected, mentions_found, \
                scores_calculated, errors, error_message, created_at \
         FROM collection_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
