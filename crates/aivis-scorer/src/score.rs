//! Per-answer visibility score.

use chrono::Utc;
use uuid::Uuid;

use aivis_core::{
    AIVisibilityScore, CitationRecord, ComponentScores, ParsedAnswer, Penalties, ScoreMetrics,
};

// Component weights. Fixed for compatibility with previously stored
// scores; do not re-tune without a migration.
const WEIGHT_MENTIONED: f64 = 0.50;
const WEIGHT_PRIMARY_CITATION: f64 = 0.30;
const WEIGHT_POSITION: f64 = 0.15;
const WEIGHT_SENTIMENT: f64 = 0.05;

/// Mention count at which the `mentioned` component saturates.
const MENTION_SATURATION: f64 = 5.0;
/// Primary-citation count at which that component saturates.
const CITATION_SATURATION: f64 = 3.0;
/// Multiplier applied when an early mention accompanies primary citations.
const EARLY_MENTION_BOOST: f64 = 1.2;
/// `position_term` threshold that counts as an early mention.
const EARLY_MENTION_THRESHOLD: f64 = 0.7;
/// Decay factor for later mentions in the position average.
const POSITION_DECAY: f64 = 0.8;

const COMPETITOR_PENALTY: f64 = 0.2;
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;
const LOW_CONFIDENCE_FACTOR: f64 = 0.1;
const NEGATIVE_SENTIMENT_THRESHOLD: f64 = 0.4;
const NEGATIVE_SENTIMENT_FACTOR: f64 = 0.15;

/// Everything the scorer reads for one `(answer, brand)` pair.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub answer_id: Uuid,
    pub brand_id: &'a str,
    pub parsed: &'a ParsedAnswer,
    pub citations: &'a [CitationRecord],
    pub owned_domain: Option<&'a str>,
}

/// Score one brand against one parsed answer.
///
/// The formula is fixed:
///
/// ```text
/// final = 0.50*mentioned + 0.30*primary_citation + 0.15*position_term
///       + 0.05*sentiment_score − penalties.total
/// final = clamp(final, 0, 1)
/// ```
///
/// A brand with zero surviving mentions returns the deterministic
/// zero-score record so absence is recorded, never inferred.
#[must_use]
pub fn score(inputs: ScoreInputs<'_>) -> AIVisibilityScore {
    let mentions = inputs.parsed.mentions_for(inputs.brand_id);
    if mentions.is_empty() {
        return AIVisibilityScore::zero(inputs.answer_id, inputs.brand_id);
    }

    #[allow(clippy::cast_precision_loss)]
    let mention_count = mentions.len() as f64;
    let avg_confidence = mentions.iter().map(|m| m.confidence).sum::<f64>() / mention_count;
    let avg_sentiment = mentions.iter().map(|m| m.sentiment).sum::<f64>() / mention_count;

    let mentioned = (mention_count / MENTION_SATURATION).min(1.0) * avg_confidence;

    let position_term = decayed_position_average(mentions.iter().map(|m| m.position_term));

    let primary_citation_count = inputs.owned_domain.map_or(0, |owned| {
        inputs
            .citations
            .iter()
            .filter(|c| matches_owned(&c.domain, owned))
            .count()
    });
    let primary_citation = if primary_citation_count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let base = (primary_citation_count as f64 / CITATION_SATURATION).min(1.0);
        let early = mentions
            .iter()
            .any(|m| m.position_term > EARLY_MENTION_THRESHOLD);
        let boosted = if early { base * EARLY_MENTION_BOOST } else { base };
        boosted.min(1.0)
    };

    let sentiment_score = avg_sentiment;

    let competitor = if inputs.parsed.is_competitive() {
        COMPETITOR_PENALTY
    } else {
        0.0
    };
    let low_confidence = if avg_confidence < LOW_CONFIDENCE_THRESHOLD {
        LOW_CONFIDENCE_FACTOR * (LOW_CONFIDENCE_THRESHOLD - avg_confidence)
    } else {
        0.0
    };
    let negative_sentiment = if avg_sentiment < NEGATIVE_SENTIMENT_THRESHOLD {
        NEGATIVE_SENTIMENT_FACTOR * (NEGATIVE_SENTIMENT_THRESHOLD - avg_sentiment)
    } else {
        0.0
    };
    let total = competitor + low_confidence + negative_sentiment;

    let weighted = WEIGHT_MENTIONED * mentioned
        + WEIGHT_PRIMARY_CITATION * primary_citation
        + WEIGHT_POSITION * position_term
        + WEIGHT_SENTIMENT * sentiment_score;
    let final_score = (weighted - total).clamp(0.0, 1.0);

    AIVisibilityScore {
        answer_id: inputs.answer_id,
        brand_id: inputs.brand_id.to_string(),
        final_score,
        component_scores: ComponentScores {
            mentioned,
            primary_citation,
            position_term,
            sentiment_score,
        },
        penalties: Penalties {
            competitor,
            low_confidence,
            negative_sentiment,
            total,
        },
        metrics: ScoreMetrics {
            mention_count: mentions.len(),
            citation_count: inputs.citations.len(),
            primary_citation_count,
            avg_confidence,
            avg_sentiment,
        },
        calculated_at: Utc::now(),
    }
}

/// Weighted average of per-mention position terms, discounting each later
/// mention in the list by `0.8^index` so earlier mentions dominate.
fn decayed_position_average(positions: impl Iterator<Item = f64>) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut weight = 1.0;
    for p in positions {
        weighted_sum += p * weight;
        weight_sum += weight;
        weight *= POSITION_DECAY;
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

fn matches_owned(domain: &str, owned: &str) -> bool {
    let owned = owned.to_ascii_lowercase();
    let owned = owned.strip_prefix("www.").unwrap_or(&owned);
    domain == owned || domain.ends_with(&format!(".{owned}"))
}
