//! Context-word lexicon for sentiment and confidence adjustment.

/// Word weights for brand-context sentiment.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. Aggregated sentiment is mapped onto
/// `[0, 1]` with 0.5 neutral.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("best", 0.5),
    ("excellent", 0.5),
    ("leading", 0.4),
    ("leader", 0.4),
    ("great", 0.4),
    ("recommend", 0.4),
    ("recommended", 0.4),
    ("trusted", 0.4),
    ("reliable", 0.4),
    ("innovative", 0.3),
    ("popular", 0.3),
    ("good", 0.3),
    ("strong", 0.3),
    ("robust", 0.3),
    ("powerful", 0.3),
    ("favorite", 0.4),
    ("top", 0.3),
    ("standout", 0.4),
    ("mature", 0.2),
    ("affordable", 0.3),
    // Negative signals
    ("worst", -0.6),
    ("avoid", -0.6),
    ("scam", -0.7),
    ("lawsuit", -0.5),
    ("breach", -0.6),
    ("banned", -0.6),
    ("recall", -0.6),
    ("unreliable", -0.5),
    ("buggy", -0.5),
    ("outdated", -0.4),
    ("slow", -0.3),
    ("expensive", -0.3),
    ("overpriced", -0.4),
    ("limited", -0.2),
    ("poor", -0.4),
    ("bad", -0.4),
    ("weak", -0.3),
    ("complaint", -0.4),
    ("complaints", -0.4),
    ("declining", -0.4),
];

/// Look up a single lowercase word in the lexicon.
pub(crate) fn word_weight(word: &str) -> Option<f64> {
    LEXICON
        .iter()
        .find(|&&(w, _)| w == word)
        .map(|&(_, weight)| weight)
}

fn context_words(context: &str) -> impl Iterator<Item = String> + '_ {
    context.split_whitespace().map(|w| {
        w.trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase()
    })
}

/// Score a context window on `[0, 1]` with 0.5 neutral.
///
/// Matching word weights are averaged on the raw `[-1, 1]` scale, then
/// mapped via `0.5 + mean/2`. A context with no lexicon words is neutral.
#[must_use]
pub fn sentiment_score(context: &str) -> f64 {
    let mut sum = 0.0_f64;
    let mut count = 0u32;
    for word in context_words(context) {
        if let Some(weight) = word_weight(&word) {
            sum += weight;
            count += 1;
        }
    }
    if count == 0 {
        return 0.5;
    }
    let mean = sum / f64::from(count);
    (0.5 + mean / 2.0).clamp(0.0, 1.0)
}

/// Confidence adjustment from context polarity.
///
/// +0.05 when the window contains at least one positive lexicon word,
/// −0.05 when it contains at least one negative word; both can apply.
#[must_use]
pub fn confidence_adjustment(context: &str) -> f64 {
    let mut has_positive = false;
    let mut has_negative = false;
    for word in context_words(context) {
        match word_weight(&word) {
            Some(w) if w > 0.0 => has_positive = true,
            Some(w) if w < 0.0 => has_negative = true,
            _ => {}
        }
    }
    let mut adjustment = 0.0;
    if has_positive {
        adjustment += 0.05;
    }
    if has_negative {
        adjustment -= 0.05;
    }
    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_is_neutral() {
        assert_eq!(sentiment_score(""), 0.5);
    }

    #[test]
    fn unknown_words_are_neutral() {
        assert_eq!(sentiment_score("the quick brown fox"), 0.5);
    }

    #[test]
    fn positive_context_scores_above_neutral() {
        let s = sentiment_score("Acme is the best and most reliable option");
        assert!(s > 0.5, "expected positive sentiment, got {s}");
    }

    #[test]
    fn negative_context_scores_below_neutral() {
        let s = sentiment_score("avoid Acme, it is buggy and unreliable");
        assert!(s < 0.5, "expected negative sentiment, got {s}");
    }

    #[test]
    fn mixed_context_lands_between_extremes() {
        let s = sentiment_score("great product but expensive");
        // great (+0.4), expensive (-0.3) → mean 0.05 → 0.525
        assert!((s - 0.525).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn punctuation_is_stripped_before_lookup() {
        assert!(sentiment_score("best!") > 0.5);
    }

    #[test]
    fn sentiment_stays_in_unit_interval() {
        let s = sentiment_score("worst scam breach banned recall avoid");
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn adjustment_positive_only() {
        assert!((confidence_adjustment("a great option") - 0.05).abs() < 1e-12);
    }

    #[test]
    fn adjustment_negative_only() {
        assert!((confidence_adjustment("known complaints") + 0.05).abs() < 1e-12);
    }

    #[test]
    fn adjustment_mixed_cancels_out() {
        assert_eq!(confidence_adjustment("great but buggy"), 0.0);
    }

    #[test]
    fn adjustment_neutral_is_zero() {
        assert_eq!(confidence_adjustment("an option"), 0.0);
    }
}
