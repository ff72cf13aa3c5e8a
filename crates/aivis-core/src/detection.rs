use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a mention's matched text related to the brand's configured terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Alias,
    Fuzzy,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Alias => write!(f, "alias"),
            MatchType::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// One detected occurrence of a brand term in an answer.
///
/// Derived and ephemeral: a detection run produces a fresh set, never
/// mutating records from an earlier run. After deduplication no two
/// mentions for the same brand have overlapping `[start_index, end_index)`
/// ranges within one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandMention {
    pub brand_id: String,
    pub matched_text: String,
    /// Byte offsets into the normalized answer text, half-open.
    pub start_index: usize,
    pub end_index: usize,
    pub match_type: MatchType,
    /// Match confidence in [0, 1]; mentions below the floor are discarded
    /// before they are ever constructed into a result set.
    pub confidence: f64,
    /// Context sentiment in [0, 1] with 0.5 neutral.
    pub sentiment: f64,
    /// Positional score in [0, 1]; earlier in the answer scores higher.
    pub position_term: f64,
    /// Ordinal inferred from ranked-list framing ("1.", "first", "top").
    pub list_rank: Option<u32>,
    /// The context window the confidence and sentiment rules evaluated.
    pub context: String,
}

/// A citation URL after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub url: String,
    /// Lowercased registrable host with any `www.` prefix stripped.
    pub domain: String,
    pub title: Option<String>,
    pub rank: u32,
    /// True iff `domain` equals or is a subdomain of a brand's owned domain.
    pub is_primary: bool,
}

/// An answer's mentions grouped by brand, with answer-level aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedAnswer {
    /// Mentions per brand slug, each list dedup-ordered by confidence
    /// descending. Brands with zero surviving mentions are absent.
    pub mentions_by_brand: BTreeMap<String, Vec<BrandMention>>,
    pub total_mentions: usize,
    /// Every brand with at least one surviving mention.
    pub competitive_brands: Vec<String>,
    /// The brand with the most mentions, ties broken by higher top
    /// confidence; `None` when nothing matched.
    pub dominant_brand: Option<String>,
}

impl ParsedAnswer {
    #[must_use]
    pub fn mentions_for(&self, brand_id: &str) -> &[BrandMention] {
        self.mentions_by_brand
            .get(brand_id)
            .map_or(&[], Vec::as_slice)
    }

    /// True when more than one brand is mentioned in the same answer.
    #[must_use]
    pub fn is_competitive(&self) -> bool {
        self.competitive_brands.len() > 1
    }
}
