//! Mention detection pipeline.

use std::collections::BTreeMap;

use regex::Regex;

use aivis_core::{
    BrandConfig, BrandMention, CitationRecord, CitedLink, EngineAnswer, MatchType, ParsedAnswer,
};

use crate::citations::build_citation_records;
use crate::normalize::normalize_answer_text;
use crate::rules::{
    self, ceil_char_boundary, floor_char_boundary, MatchCandidate, CONFIDENCE_FLOOR,
    CONTEXT_WINDOW,
};

/// Full detection output for one answer.
#[derive(Debug, Clone)]
pub struct Detection {
    pub mentions: Vec<BrandMention>,
    pub citations: Vec<CitationRecord>,
    pub parsed: ParsedAnswer,
}

/// Detect brand mentions and citations in one answer's text.
///
/// Mentions are returned grouped by brand in input order, each group
/// ordered by confidence descending after overlap deduplication. A brand
/// with no surviving matches simply contributes nothing. Detection is
/// pure: the same `(text, brands, urls)` always yields the same output.
#[must_use]
pub fn detect(
    answer_text: &str,
    brands: &[BrandConfig],
    citation_urls: &[String],
) -> (Vec<BrandMention>, Vec<CitationRecord>) {
    let links: Vec<CitedLink> = citation_urls
        .iter()
        .enumerate()
        .map(|(i, url)| CitedLink {
            url: url.clone(),
            title: None,
            #[allow(clippy::cast_possible_truncation)]
            rank: (i + 1) as u32,
        })
        .collect();
    let detection = run_detection(answer_text, brands, &links);
    (detection.mentions, detection.citations)
}

/// Detect against a collected [`EngineAnswer`], preserving link titles.
#[must_use]
pub fn detect_answer(answer: &EngineAnswer, brands: &[BrandConfig]) -> Detection {
    run_detection(&answer.answer_text, brands, &answer.cited_links)
}

fn run_detection(
    answer_text: &str,
    brands: &[BrandConfig],
    cited_links: &[CitedLink],
) -> Detection {
    let text = normalize_answer_text(answer_text);
    let lower = text.to_lowercase();

    let mut mentions = Vec::new();
    for brand in brands {
        let brand_mentions = detect_brand(&text, &lower, brand);
        mentions.extend(brand_mentions);
    }

    let citations = build_citation_records(cited_links, &text, brands);
    let parsed = parse_answer(&mentions);

    Detection {
        mentions,
        citations,
        parsed,
    }
}

/// All surviving mentions for one brand, deduplicated and ordered by
/// confidence descending.
fn detect_brand(text: &str, lower: &str, brand: &BrandConfig) -> Vec<BrandMention> {
    let brand_id = brand.slug();
    let mut candidates: Vec<BrandMention> = Vec::new();

    for term in brand.search_terms() {
        if term.trim().is_empty() {
            continue;
        }
        let lower_term = term.to_lowercase();
        if rules::term_has_negative_context(lower, &lower_term, &brand.negative_terms) {
            tracing::debug!(
                brand = %brand_id,
                term,
                "skipping term: negative term in window"
            );
            continue;
        }

        let match_type = if term == brand.name {
            MatchType::Exact
        } else {
            MatchType::Alias
        };

        for (start, end) in token_boundary_matches(text, term) {
            let context_start = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
            let context_end = ceil_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
            let candidate = MatchCandidate {
                term,
                brand_name: &brand.name,
                matched_text: &text[start..end],
                start,
                end,
                context_before: &text[context_start..start],
                context_after: &text[end..context_end],
            };

            if let Some(rule) = rules::first_rejecting_rule(&candidate) {
                tracing::debug!(brand = %brand_id, term, rule, start, "candidate rejected");
                continue;
            }

            let confidence = rules::confidence(&candidate);
            if confidence < CONFIDENCE_FLOOR {
                tracing::debug!(brand = %brand_id, term, confidence, "below confidence floor");
                continue;
            }

            let context = candidate.context();
            candidates.push(BrandMention {
                brand_id: brand_id.clone(),
                matched_text: candidate.matched_text.to_string(),
                start_index: start,
                end_index: end,
                match_type,
                confidence,
                sentiment: crate::lexicon::sentiment_score(&context),
                position_term: rules::position_term(start, text.len()),
                list_rank: rules::infer_list_rank(candidate.context_before),
                context,
            });
        }
    }

    dedup_by_confidence(candidates)
}

/// Byte ranges of case-insensitive term matches bounded by non-word
/// characters (or text edges) on both sides. A term embedded in a longer
/// identifier ("Go" inside "Google", "acme" inside "acme_sdk") never
/// matches.
fn token_boundary_matches(text: &str, term: &str) -> Vec<(usize, usize)> {
    let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(term))) else {
        return Vec::new();
    };
    re.find_iter(text)
        .filter(|m| {
            let before_ok = text[..m.start()]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_');
            let after_ok = text[m.end()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_');
            before_ok && after_ok
        })
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Sort by confidence descending (start index breaking ties for
/// determinism) and drop any mention overlapping an already-kept range.
fn dedup_by_confidence(mut mentions: Vec<BrandMention>) -> Vec<BrandMention> {
    mentions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.start_index.cmp(&b.start_index))
            .then(a.end_index.cmp(&b.end_index))
    });

    let mut kept: Vec<BrandMention> = Vec::new();
    for mention in mentions {
        let overlaps = kept
            .iter()
            .any(|k| mention.start_index < k.end_index && k.start_index < mention.end_index);
        if !overlaps {
            kept.push(mention);
        }
    }
    kept
}

/// Group mentions by brand and derive answer-level aggregates.
#[must_use]
pub fn parse_answer(mentions: &[BrandMention]) -> ParsedAnswer {
    let mut by_brand: BTreeMap<String, Vec<BrandMention>> = BTreeMap::new();
    for mention in mentions {
        by_brand
            .entry(mention.brand_id.clone())
            .or_default()
            .push(mention.clone());
    }

    let total_mentions = mentions.len();
    let competitive_brands: Vec<String> = by_brand.keys().cloned().collect();

    let dominant_brand = by_brand
        .iter()
        .max_by(|(_, a), (_, b)| {
            let a_top = a.first().map_or(0.0, |m| m.confidence);
            let b_top = b.first().map_or(0.0, |m| m.confidence);
            a.len()
                .cmp(&b.len())
                .then(a_top.partial_cmp(&b_top).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(brand, _)| brand.clone());

    ParsedAnswer {
        mentions_by_brand: by_brand,
        total_mentions,
        competitive_brands,
        dominant_brand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str) -> BrandConfig {
        BrandConfig {
            name: name.to_string(),
            aliases: Vec::new(),
            negative_terms: Vec::new(),
            owned_domain: None,
            locale: "en".to_string(),
        }
    }

    #[test]
    fn detects_simple_mention() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("Many teams choose Acme for tracking.", &brands, &[]);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].brand_id, "acme");
        assert_eq!(mentions[0].matched_text, "Acme");
        assert_eq!(mentions[0].match_type, MatchType::Exact);
        assert!(mentions[0].confidence >= CONFIDENCE_FLOOR);
    }

    #[test]
    fn token_boundary_rejects_substring_containment() {
        let brands = vec![brand("Go")];
        let (mentions, _) = detect("Google dominates search.", &brands, &[]);
        assert!(mentions.is_empty(), "'Go' must not match inside 'Google'");
    }

    #[test]
    fn token_boundary_allows_punctuation_neighbors() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("Try (Acme), it works.", &brands, &[]);
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn underscore_is_a_word_character() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("install acme_sdk today", &brands, &[]);
        assert!(mentions.is_empty());
    }

    #[test]
    fn negated_mention_is_rejected() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("The answer is not Acme in this case.", &brands, &[]);
        assert!(mentions.is_empty());
    }

    #[test]
    fn contraction_negation_is_rejected() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("It isn't Acme you want here.", &brands, &[]);
        assert!(mentions.is_empty());
    }

    #[test]
    fn versus_framing_is_rejected() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("Read our Zen vs. Acme comparison.", &brands, &[]);
        assert!(mentions.is_empty());
    }

    #[test]
    fn negative_term_in_window_skips_term() {
        let mut apple = brand("Apple");
        apple.negative_terms = vec!["fruit".to_string()];
        let (mentions, _) = detect("Apple is a delicious fruit rich in fiber.", &[apple], &[]);
        assert!(mentions.is_empty());
    }

    #[test]
    fn negative_term_far_away_does_not_skip() {
        let mut apple = brand("Apple");
        apple.negative_terms = vec!["fruit".to_string()];
        let padding = "filler words ".repeat(20);
        let text = format!("Apple ships new laptops. {padding} The fruit aisle is elsewhere.");
        let (mentions, _) = detect(&text, &[apple], &[]);
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn alias_matches_are_tagged_alias() {
        let mut b = brand("Acme");
        b.aliases = vec!["Acme Inc".to_string()];
        let (mentions, _) = detect("Acme Inc posted record results.", &[b], &[]);
        // "Acme Inc" overlaps "Acme"; the higher-confidence exact-name match
        // and the alias compete, overlap dedup keeps one.
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn overlapping_mentions_dedup_keeps_highest_confidence() {
        let mut b = brand("Acme");
        b.aliases = vec!["Acme Platform".to_string()];
        let (mentions, _) = detect("The Acme Platform is popular.", &[b], &[]);
        assert_eq!(mentions.len(), 1);
        let m = &mentions[0];
        for other in &mentions[1..] {
            assert!(m.end_index <= other.start_index || other.end_index <= m.start_index);
        }
    }

    #[test]
    fn multiple_distinct_mentions_survive() {
        let brands = vec![brand("Acme")];
        let text = "Acme leads the pack. Later in the report, Acme again appears.";
        let (mentions, _) = detect(text, &brands, &[]);
        assert_eq!(mentions.len(), 2);
        // dedup-ordered by confidence descending
        assert!(mentions[0].confidence >= mentions[1].confidence);
    }

    #[test]
    fn zero_mentions_is_empty_not_error() {
        let brands = vec![brand("Acme")];
        let (mentions, citations) = detect("Nothing relevant here.", &brands, &[]);
        assert!(mentions.is_empty());
        assert!(citations.is_empty());
    }

    #[test]
    fn detection_is_idempotent() {
        let mut b = brand("Acme");
        b.aliases = vec!["Acme Inc".to_string()];
        b.owned_domain = Some("acme.com".to_string());
        let brands = vec![b, brand("Zen")];
        let text = "1. Acme is the best pick. Zen trails. See https://acme.com/why?utm_source=x";
        let urls = vec!["https://review.example.com/roundup".to_string()];

        let first = detect(text, &brands, &urls);
        let second = detect(text, &brands, &urls);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn markdown_emphasis_does_not_hide_mentions() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("**Acme** tops our list.", &brands, &[]);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].matched_text, "Acme");
    }

    #[test]
    fn list_rank_inferred_from_numbered_list() {
        let brands = vec![brand("Acme")];
        let (mentions, _) = detect("Top picks: 1. Acme leads the field.", &brands, &[]);
        assert_eq!(mentions[0].list_rank, Some(1));
    }

    #[test]
    fn early_mention_scores_higher_position_than_late() {
        let brands = vec![brand("Acme")];
        let filler = "other words ".repeat(40);
        let text = format!("Acme opens the answer. {filler} Acme closes the answer.");
        let (mentions, _) = detect(&text, &brands, &[]);
        assert_eq!(mentions.len(), 2);
        let by_start: Vec<&BrandMention> = {
            let mut v: Vec<&BrandMention> = mentions.iter().collect();
            v.sort_by_key(|m| m.start_index);
            v
        };
        assert!(by_start[0].position_term > by_start[1].position_term);
    }

    #[test]
    fn parse_answer_groups_and_finds_dominant() {
        let brands = vec![brand("Acme"), brand("Zen")];
        let text = "Acme leads. Acme ships fast. Zen is a newer option.";
        let (mentions, _) = detect(text, &brands, &[]);
        let parsed = parse_answer(&mentions);
        assert_eq!(parsed.total_mentions, 3);
        assert_eq!(parsed.competitive_brands.len(), 2);
        assert!(parsed.is_competitive());
        assert_eq!(parsed.dominant_brand.as_deref(), Some("acme"));
        assert_eq!(parsed.mentions_for("zen").len(), 1);
    }

    #[test]
    fn detect_answer_keeps_citation_titles() {
        let answer = EngineAnswer::new(
            "perplexity",
            "p1",
            "best tracker",
            "en",
            "Acme is widely recommended.",
            vec![CitedLink {
                url: "https://www.acme.com/report?utm_campaign=z".to_string(),
                title: Some("Acme Report".to_string()),
                rank: 1,
            }],
            serde_json::json!({}),
        );
        let mut b = brand("Acme");
        b.owned_domain = Some("acme.com".to_string());
        let detection = detect_answer(&answer, &[b]);
        assert_eq!(detection.citations.len(), 1);
        assert_eq!(detection.citations[0].title.as_deref(), Some("Acme Report"));
        assert_eq!(detection.citations[0].url, "https://www.acme.com/report");
        assert!(detection.citations[0].is_primary);
        assert_eq!(detection.parsed.total_mentions, 1);
    }
}
