//! Answer-text normalization.
//!
//! Answer engines return markdown-flavoured prose with citation brackets
//! and typographic quotes. Matching runs over a normalized form so that
//! `**Acme**` and `Acme` detect identically. Mention offsets refer into
//! the normalized text.

use std::sync::OnceLock;

use regex::Regex;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap())
}

fn citation_bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d{1,3}\]").unwrap())
}

fn emphasis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Emphasis runs and inline-code backticks. Single underscores are left
    // alone so snake_case identifiers survive intact.
    RE.get_or_init(|| Regex::new(r"\*{1,3}|_{2,3}|`").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Normalize raw answer text for matching.
///
/// Strips markdown headers, emphasis markers, inline code ticks, and
/// numeric citation brackets (`[3]`), converts typographic quotes to their
/// ASCII forms, and collapses all whitespace runs to single spaces.
#[must_use]
pub fn normalize_answer_text(raw: &str) -> String {
    let text = header_re().replace_all(raw, "");
    let text = citation_bracket_re().replace_all(&text, "");
    let text = emphasis_re().replace_all(&text, "");
    let text = text
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}
