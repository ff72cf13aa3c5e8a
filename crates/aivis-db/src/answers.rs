//! Database operations for answers and their derived records.
//!
//! One answer's mentions, citations, and scores are written together in a
//! single transaction; a failure rolls the whole bundle back so a partial
//! answer never becomes visible.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aivis_orchestrator::AnswerBundle;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `answers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: Uuid,
    pub engine_id: String,
    pub prompt_id: String,
    pub query_text: String,
    pub locale: String,
    pub collected_at: DateTime<Utc>,
    pub answer_text: String,
    pub raw_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A row from the `brand_mentions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: i64,
    pub answer_id: Uuid,
    pub brand_id: String,
    pub matched_text: String,
    pub start_index: i64,
    pub end_index: i64,
    pub match_type: String,
    pub confidence: f64,
    pub sentiment: f64,
    pub position_term: f64,
    pub list_rank: Option<i32>,
    pub context: String,
}

/// A row from the `answer_citations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationRow {
    pub id: i64,
    pub answer_id: Uuid,
    pub url: String,
    pub domain: String,
    pub title: Option<String>,
    pub rank: i32,
    pub is_primary: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Insert one answer bundle transactionally.
///
/// The answer row, every mention, every citation, and every score land in
/// one transaction. `(answer_id, brand_id)` uniqueness on scores means
/// concurrent writes for different answers never conflict.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is committed in
/// that case.
pub async fn insert_answer_bundle(pool: &PgPool, bundle: &AnswerBundle) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let answer = &bundle.answer;
    sqlx::query(
        "INSERT INTO answers (id, engine_id, prompt_id, query_text, locale, \
                              collected_at, answer_text, raw_payload) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(answer.id)
    .bind(&answer.engine_id)
    .bind(&answer.prompt_id)
    .bind(&answer.query_text)
    .bind(&answer.locale)
    .bind(answer.collected_at)
    .bind(&answer.answer_text)
    .bind(&answer.raw_payload)
    .execute(&mut *tx)
    .await?;

    for mention in &bundle.mentions {
        sqlx::query(
            "INSERT INTO brand_mentions \
                 (answer_id, brand_id, matched_text, start_index, end_index, \
                  match_type, confidence, sentiment, position_term, list_rank, context) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(answer.id)
        .bind(&mention.brand_id)
        .bind(&mention.matched_text)
        .bind(i64::try_from(mention.start_index).unwrap_or(i64::MAX))
        .bind(i64::try_from(mention.end_index).unwrap_or(i64::MAX))
        .bind(mention.match_type.to_string())
        .bind(mention.confidence)
        .bind(mention.sentiment)
        .bind(mention.position_term)
        .bind(mention.list_rank.map(|r| i32::try_from(r).unwrap_or(i32::MAX)))
        .bind(&mention.context)
        .execute(&mut *tx)
        .await?;
    }

    for citation in &bundle.citations {
        sqlx::query(
            "INSERT INTO answer_citations (answer_id, url, domain, title, rank, is_primary) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(answer.id)
        .bind(&citation.url)
        .bind(&citation.domain)
        .bind(citation.title.as_deref())
        .bind(i32::try_from(citation.rank).unwrap_or(i32::MAX))
        .bind(citation.is_primary)
        .execute(&mut *tx)
        .await?;
    }

    for score in &bundle.scores {
        sqlx::query(
            "INSERT INTO visibility_scores \
                 (answer_id, brand_id, final_score, component_scores, penalties, \
                  metrics, calculated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(score.answer_id)
        .bind(&score.brand_id)
        .bind(score.final_score)
        .bind(serde_json::to_value(score.component_scores)?)
        .bind(serde_json::to_value(score.penalties)?)
        .bind(serde_json::to_value(score.metrics)?)
        .bind(score.calculated_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Fetch one answer by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_answer(pool: &PgPool, id: Uuid) -> Result<AnswerRow, DbError> {
    sqlx::query_as::<_, AnswerRow>(
        "SELECT id, engine_id, prompt_id, query_text, locale, collected_at, \
                answer_text, raw_payload, created_at \
         FROM answers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// All mentions recorded for one answer, highest confidence first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mentions_for_answer(
    pool: &PgPool,
    answer_id: Uuid,
) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(
        "SELECT id, answer_id, brand_id, matched_text, start_index, end_index, \
                match_type, confidence, sentiment, position_term, list_rank, context \
         FROM brand_mentions \
         WHERE answer_id = $1 \
         ORDER BY confidence DESC, start_index ASC",
    )
    .bind(answer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All citations for one answer in original rank order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_citations_for_answer(
    pool: &PgPool,
    answer_id: Uuid,
) -> Result<Vec<CitationRow>, DbError> {
    let rows = sqlx::query_as::<_, CitationRow>(
        "SELECT id, answer_id, url, domain, title, rank, is_primary \
         FROM answer_citations \
         WHERE answer_id = $1 \
         ORDER BY rank ASC",
    )
    .bind(answer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
