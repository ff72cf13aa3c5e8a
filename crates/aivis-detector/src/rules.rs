//! Precision rules applied to match candidates.
//!
//! Rules run as an ordered pipeline: term-level pre-filters first, then
//! per-candidate filters, then the confidence scorer. Each rule is a named
//! function so a single precision control can be unit-tested and tuned
//! without touching the rest of the pipeline.

use crate::lexicon;

/// Character window scanned around a term occurrence for negative terms.
pub const NEGATIVE_TERM_WINDOW: usize = 100;

/// Characters of context captured on each side of a match.
pub const CONTEXT_WINDOW: usize = 120;

/// Minimum confidence for a candidate to become a mention.
pub const CONFIDENCE_FLOOR: f64 = 0.7;

/// Words that negate an immediately following brand mention.
const NEGATION_WORDS: &[&str] = &["not", "isn't", "doesn't", "don't", "never", "no"];

/// A term occurrence that survived token-boundary matching but has not yet
/// been filtered or scored.
#[derive(Debug, Clone)]
pub struct MatchCandidate<'a> {
    /// The configured search term that produced this match.
    pub term: &'a str,
    /// The brand's canonical name.
    pub brand_name: &'a str,
    /// Slice of the normalized text that matched.
    pub matched_text: &'a str,
    pub start: usize,
    pub end: usize,
    /// Context before the match, up to [`CONTEXT_WINDOW`] chars.
    pub context_before: &'a str,
    /// Context after the match, up to [`CONTEXT_WINDOW`] chars.
    pub context_after: &'a str,
}

impl MatchCandidate<'_> {
    #[must_use]
    pub fn context(&self) -> String {
        format!(
            "{}{}{}",
            self.context_before, self.matched_text, self.context_after
        )
    }
}

/// Candidate filters in evaluation order. The first rejecting rule wins;
/// its name is logged at debug level by the detector.
pub(crate) const CANDIDATE_FILTERS: &[(&str, fn(&MatchCandidate<'_>) -> bool)] = &[
    ("negation_context", passes_negation_context),
    ("versus_framing", passes_versus_framing),
];

/// Term-level pre-filter: skip a term entirely when one of the brand's
/// negative terms appears within [`NEGATIVE_TERM_WINDOW`] chars of any
/// occurrence of the term. Both inputs must already be lowercase.
///
/// This runs before any regex matching so an "Apple the fruit" answer
/// never produces candidates for the company at all.
#[must_use]
pub fn term_has_negative_context(
    lower_text: &str,
    lower_term: &str,
    negative_terms: &[String],
) -> bool {
    if negative_terms.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(found) = lower_text[from..].find(lower_term) {
        let at = from + found;
        let window_start = floor_char_boundary(lower_text, at.saturating_sub(NEGATIVE_TERM_WINDOW));
        let window_end = ceil_char_boundary(
            lower_text,
            (at + lower_term.len() + NEGATIVE_TERM_WINDOW).min(lower_text.len()),
        );
        let window = &lower_text[window_start..window_end];
        if negative_terms
            .iter()
            .any(|neg| window.contains(neg.to_lowercase().as_str()))
        {
            return true;
        }
        from = at + lower_term.len();
    }
    false
}

/// Reject candidates whose immediately preceding words negate the mention
/// ("not Acme", "isn't Acme"). Only the last two words before the match
/// are considered; a negation further back is attributing something else.
fn passes_negation_context(candidate: &MatchCandidate<'_>) -> bool {
    let tail: Vec<String> = candidate
        .context_before
        .split_whitespace()
        .rev()
        .take(2)
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .collect();
    !tail.iter().any(|w| NEGATION_WORDS.contains(&w.as_str()))
}

/// Reject candidates framed as a comparison ("X vs. Acme", "Acme versus Y")
/// where sentiment in the window cannot be attributed to either side.
fn passes_versus_framing(candidate: &MatchCandidate<'_>) -> bool {
    let before_tail: String = candidate
        .context_before
        .split_whitespace()
        .rev()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let after_head: String = candidate
        .context_after
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let is_versus = |s: &str| {
        s.split_whitespace()
            .any(|w| matches!(w.trim_matches('.'), "vs" | "versus"))
    };
    !(is_versus(&before_tail) || is_versus(&after_head))
}

/// Run every candidate filter in order; returns the name of the first
/// rejecting rule, or `None` when the candidate passes.
#[must_use]
pub fn first_rejecting_rule(candidate: &MatchCandidate<'_>) -> Option<&'static str> {
    CANDIDATE_FILTERS
        .iter()
        .find(|(_, rule)| !rule(candidate))
        .map(|(name, _)| *name)
}

/// Score a surviving candidate's confidence on `[0, 1]`.
///
/// Starts at 0.5, then:
/// - +0.3 when the matched text equals the full brand name case-insensitively;
/// - +0.1 when the matched text equals the configured term exactly;
/// - +0.1 for capitalized proper-noun form;
/// - ±0.05 for positive/negative lexicon words in the context window.
#[must_use]
pub fn confidence(candidate: &MatchCandidate<'_>) -> f64 {
    let mut score = 0.5;

    if candidate
        .matched_text
        .eq_ignore_ascii_case(candidate.brand_name)
    {
        score += 0.3;
    }
    if candidate.matched_text == candidate.term {
        score += 0.1;
    }
    if is_proper_noun_form(candidate.matched_text) {
        score += 0.1;
    }
    score += lexicon::confidence_adjustment(&candidate.context());

    score.clamp(0.0, 1.0)
}

/// "Acme" and "Acme Inc" qualify; "acme" and "ACME" do not.
fn is_proper_noun_form(text: &str) -> bool {
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| {
        let mut chars = w.chars();
        chars
            .next()
            .is_some_and(|first| first.is_uppercase())
            && chars.all(|c| !c.is_uppercase())
    })
}

/// Positional score of a match, decaying 1.0 → 0.2 across five bands of
/// text-relative position. An early mention in a long answer is worth more
/// than a footnote.
#[must_use]
pub fn position_term(start: usize, text_len: usize) -> f64 {
    if text_len == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let relative = start as f64 / text_len as f64;
    if relative < 0.2 {
        1.0
    } else if relative < 0.4 {
        0.8
    } else if relative < 0.6 {
        0.6
    } else if relative < 0.8 {
        0.4
    } else {
        0.2
    }
}

/// Infer a ranked-list position from the text immediately preceding a
/// match: `"3. Acme"` → 3, `"first"`/`"top"` → 1, `"second"` → 2,
/// `"third"` → 3.
#[must_use]
pub fn infer_list_rank(context_before: &str) -> Option<u32> {
    let tail = context_before.trim_end();

    // Numeric list marker directly before the match: "3." / "3)" / "3:".
    let digits: String = tail
        .strip_suffix(['.', ')', ':'])
        .map(|rest| {
            rest.chars()
                .rev()
                .take_while(char::is_ascii_digit)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect()
        })
        .unwrap_or_default();
    if !digits.is_empty() && digits.len() <= 2 {
        if let Ok(rank) = digits.parse::<u32>() {
            if rank >= 1 {
                return Some(rank);
            }
        }
    }

    let last_word = tail
        .split_whitespace()
        .next_back()?
        .trim_matches(|c: char| !c.is_alphabetic())
        .to_lowercase();
    match last_word.as_str() {
        "first" | "top" => Some(1),
        "second" => Some(2),
        "third" => Some(3),
        _ => None,
    }
}

/// Largest char boundary ≤ `index`.
pub(crate) fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary ≥ `index`.
pub(crate) fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
