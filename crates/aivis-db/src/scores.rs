//! Database reads for visibility scores.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aivis_core::{AIVisibilityScore, ComponentScores, Penalties, ScoreMetrics};

use crate::DbError;

/// A row from the `visibility_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreRow {
    pub id: i64,
    pub answer_id: Uuid,
    pub brand_id: String,
    pub final_score: f64,
    pub component_scores: serde_json::Value,
    pub penalties: serde_json::Value,
    pub metrics: serde_json::Value,
    pub calculated_at: DateTime<Utc>,
}

impl ScoreRow {
    /// Rebuild the domain score from its stored JSON columns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] when a JSON column no longer matches the
    /// domain shape (schema drift).
    pub fn into_score(self) -> Result<AIVisibilityScore, DbError> {
        let component_scores: ComponentScores = serde_json::from_value(self.component_scores)?;
        let penalties: Penalties = serde_json::from_value(self.penalties)?;
        let metrics: ScoreMetrics = serde_json::from_value(self.metrics)?;
        Ok(AIVisibilityScore {
            answer_id: self.answer_id,
            brand_id: self.brand_id,
            final_score: self.final_score,
            component_scores,
            penalties,
            metrics,
            calculated_at: self.calculated_at,
        })
    }
}

/// Scores calculated within the trailing `window_days`, newest first,
/// optionally narrowed to one brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Json`]
/// if a stored JSON column fails to decode.
pub async fn list_scores_in_window(
    pool: &PgPool,
    brand_id: Option<&str>,
    window_days: u32,
) -> Result<Vec<AIVisibilityScore>, DbError> {
    let rows = sqlx::query_as::<_, ScoreRow>(
        "SELECT id, answer_id, brand_id, final_score, component_scores, \
                penalties, metrics, calculated_at \
         FROM visibility_scores \
         WHERE calculated_at >= NOW() - make_interval(days => $1) \
           AND ($2::text IS NULL OR brand_id = $2) \
         ORDER BY calculated_at DESC",
    )
    .bind(i32::try_from(window_days).unwrap_or(i32::MAX))
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ScoreRow::into_score).collect()
}
