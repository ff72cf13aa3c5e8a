//! Rolling visibility index.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use aivis_core::AIVisibilityScore;

/// Per-position recency decay applied to a brand's score history.
const RECENCY_DECAY: f64 = 0.9;

/// Compute the 0–100 visibility index over the trailing window ending now.
#[must_use]
pub fn visibility_index(scores: &[AIVisibilityScore], window_days: u32) -> u32 {
    visibility_index_at(scores, window_days, Utc::now())
}

/// Compute the index against an explicit end-of-window instant.
///
/// Scores older than `window_days` before `now` are ignored. Remaining
/// scores are grouped by brand and ordered most recent first; each
/// position is weighted `0.9^position` so the newest answers dominate.
/// The index is `round(100 * best_brand_weighted_average)` — it reflects
/// the single best-performing brand in the set, not a sum across brands.
#[must_use]
pub fn visibility_index_at(
    scores: &[AIVisibilityScore],
    window_days: u32,
    now: DateTime<Utc>,
) -> u32 {
    let cutoff = now - Duration::days(i64::from(window_days));

    let mut by_brand: BTreeMap<&str, Vec<&AIVisibilityScore>> = BTreeMap::new();
    for s in scores {
        if s.calculated_at >= cutoff && s.calculated_at <= now {
            by_brand.entry(s.brand_id.as_str()).or_default().push(s);
        }
    }

    let best = by_brand
        .values_mut()
        .map(|brand_scores| {
            brand_scores.sort_by_key(|s| std::cmp::Reverse(s.calculated_at));
            weighted_average(brand_scores.iter().map(|s| s.final_score))
        })
        .fold(0.0_f64, f64::max);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (best * 100.0).round() as u32;
    index
}

fn weighted_average(values: impl Iterator<Item = f64>) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut weight = 1.0;
    for v in values {
        weighted_sum += v * weight;
        weight_sum += weight;
        weight *= RECENCY_DECAY;
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dated_score(brand: &str, final_score: f64, days_ago: i64, now: DateTime<Utc>) -> AIVisibilityScore {
        let mut s = AIVisibilityScore::zero(Uuid::new_v4(), brand);
        s.final_score = final_score;
        s.calculated_at = now - Duration::days(days_ago);
        s
    }

    #[test]
    fn empty_scores_yield_zero() {
        assert_eq!(visibility_index(&[], 30), 0);
    }

    #[test]
    fn single_score_maps_to_percent() {
        let now = Utc::now();
        let scores = vec![dated_score("acme", 0.42, 1, now)];
        assert_eq!(visibility_index_at(&scores, 30, now), 42);
    }

    #[test]
    fn scores_outside_window_are_ignored() {
        let now = Utc::now();
        let scores = vec![
            dated_score("acme", 0.9, 60, now),
            dated_score("acme", 0.3, 2, now),
        ];
        assert_eq!(visibility_index_at(&scores, 30, now), 30);
    }

    #[test]
    fn index_takes_best_brand_not_sum() {
        let now = Utc::now();
        let scores = vec![
            dated_score("acme", 0.6, 1, now),
            dated_score("zen", 0.4, 1, now),
        ];
        assert_eq!(visibility_index_at(&scores, 30, now), 60);
    }

    #[test]
    fn recency_weighting_favors_latest_scores() {
        // Five strictly increasing daily scores; the weighted result must
        // land closer to the newest (highest) value than the plain mean.
        let now = Utc::now();
        let values = [0.1, 0.2, 0.3, 0.4, 0.5];
        let scores: Vec<AIVisibilityScore> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                #[allow(clippy::cast_possible_wrap)]
                let days_ago = (values.len() - 1 - i) as i64;
                dated_score("acme", v, days_ago, now)
            })
            .collect();

        let index = visibility_index_at(&scores, 30, now);
        let plain_mean = values.iter().sum::<f64>() / values.len() as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mean_index = (plain_mean * 100.0).round() as u32;

        assert!(
            index > mean_index,
            "recency-weighted index {index} should exceed plain mean {mean_index}"
        );

        // Exact weighted value: newest first [0.5, 0.4, 0.3, 0.2, 0.1]
        // with weights [1, .9, .81, .729, .6561].
        let weights = [1.0, 0.9, 0.81, 0.729, 0.6561];
        let newest_first = [0.5, 0.4, 0.3, 0.2, 0.1];
        let expected: f64 = newest_first
            .iter()
            .zip(weights.iter())
            .map(|(v, w)| v * w)
            .sum::<f64>()
            / weights.iter().sum::<f64>();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected_index = (expected * 100.0).round() as u32;
        assert_eq!(index, expected_index);
    }

    #[test]
    fn index_never_exceeds_one_hundred() {
        let now = Utc::now();
        let scores = vec![
            dated_score("acme", 1.0, 0, now),
            dated_score("acme", 1.0, 1, now),
        ];
        assert_eq!(visibility_index_at(&scores, 30, now), 100);
    }
}
