use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The weighted inputs to a final visibility score, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub mentioned: f64,
    pub primary_citation: f64,
    pub position_term: f64,
    pub sentiment_score: f64,
}

/// Deductions applied after the weighted sum, each independently capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Penalties {
    pub competitor: f64,
    pub low_confidence: f64,
    pub negative_sentiment: f64,
    pub total: f64,
}

/// Raw counts and averages backing the component scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub mention_count: usize,
    pub citation_count: usize,
    pub primary_citation_count: usize,
    pub avg_confidence: f64,
    pub avg_sentiment: f64,
}

/// A brand's visibility score for one answer.
///
/// Computed once per `(answer, brand)` pair and never updated in place;
/// a correction produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIVisibilityScore {
    pub answer_id: Uuid,
    pub brand_id: String,
    pub final_score: f64,
    pub component_scores: ComponentScores,
    pub penalties: Penalties,
    pub metrics: ScoreMetrics,
    pub calculated_at: DateTime<Utc>,
}

impl AIVisibilityScore {
    /// The deterministic record for a brand absent from an answer. Absence
    /// is recorded explicitly rather than inferred from missing rows.
    #[must_use]
    pub fn zero(answer_id: Uuid, brand_id: impl Into<String>) -> Self {
        Self {
            answer_id,
            brand_id: brand_id.into(),
            final_score: 0.0,
            component_scores: ComponentScores {
                mentioned: 0.0,
                primary_citation: 0.0,
                position_term: 0.0,
                sentiment_score: 0.5,
            },
            penalties: Penalties {
                competitor: 0.0,
                low_confidence: 0.0,
                negative_sentiment: 0.0,
                total: 0.0,
            },
            metrics: ScoreMetrics {
                mention_count: 0,
                citation_count: 0,
                primary_citation_count: 0,
                avg_confidence: 0.0,
                avg_sentiment: 0.5,
            },
            calculated_at: Utc::now(),
        }
    }
}
