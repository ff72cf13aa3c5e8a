//! Answer-text and citation extraction from engine payloads.
//!
//! Engines disagree wildly about response shape, so text extraction runs a
//! prioritized strategy list and only falls back to "all visible text"
//! when no structured field matches.

use std::collections::HashSet;

use serde_json::Value;

use aivis_core::CitedLink;

/// Maximum number of citation links taken from one answer.
pub const MAX_CITATIONS: usize = 10;

/// Hosts that are advertising/tracking infrastructure, never answer sources.
const BLOCKED_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googleadservices.com",
    "google-analytics.com",
    "googletagmanager.com",
    "amazon-adsystem.com",
    "adservice.google.com",
];

/// Direct file downloads are not citable content pages.
const BLOCKED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".gz", ".exe", ".dmg", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
];

type Strategy = fn(&Value) -> Option<String>;

/// Ordered extraction strategies; the first non-empty result wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("answer_field", extract_answer_field),
    ("message_content", extract_message_content),
    ("text_blocks", extract_text_blocks),
];

/// Extract the answer text from an engine payload.
///
/// Tries each strategy in priority order, then falls back to concatenating
/// every visible text field in the payload. Returns `None` only when the
/// fallback also finds nothing — callers treat that as a reportable
/// empty-extraction condition, never as a silent empty answer.
#[must_use]
pub fn extract_answer_text(payload: &Value) -> Option<String> {
    for (name, strategy) in STRATEGIES {
        if let Some(text) = strategy(payload) {
            let text = text.trim().to_string();
            if !text.is_empty() {
                tracing::debug!(strategy = name, "extracted answer text");
                return Some(text);
            }
        }
    }
    let fallback = visible_text(payload);
    let fallback = fallback.trim().to_string();
    if fallback.is_empty() {
        None
    } else {
        tracing::debug!(strategy = "visible_text", "extracted answer text via fallback");
        Some(fallback)
    }
}

/// `{"answer": "..."}` or `{"answer": {"text": "..."}}`.
fn extract_answer_field(payload: &Value) -> Option<String> {
    match payload.get("answer") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj @ Value::Object(_)) => obj
            .get("text")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}

/// `{"message": {"content": "..."}}` or OpenAI-style
/// `{"choices": [{"message": {"content": "..."}}]}`.
fn extract_message_content(payload: &Value) -> Option<String> {
    let direct = payload
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str);
    if let Some(s) = direct {
        return Some(s.to_string());
    }
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(ToString::to_string)
}

/// `{"blocks": [{"type": "text", "text": "..."}, ...]}` concatenated.
fn extract_text_blocks(payload: &Value) -> Option<String> {
    let blocks = payload.get("blocks")?.as_array()?;
    let parts: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Fallback: every string under a text-bearing key, in document order.
fn visible_text(payload: &Value) -> String {
    const TEXT_KEYS: &[&str] = &["text", "content", "snippet", "summary"];
    let mut parts = Vec::new();
    collect_text(payload, TEXT_KEYS, &mut parts);
    parts.join(" ")
}

fn collect_text(value: &Value, keys: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if let Value::String(s) = child {
                    if keys.contains(&key.as_str()) && !s.trim().is_empty() {
                        out.push(s.trim().to_string());
                    }
                } else {
                    collect_text(child, keys, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, keys, out);
            }
        }
        _ => {}
    }
}

/// Extract up to [`MAX_CITATIONS`] cited links from an engine payload.
///
/// Looks for the first of `citations`/`sources`/`links`/`references`
/// arrays, accepts bare URL strings or `{url|link|href, title|name}`
/// objects, drops file downloads and ad/tracking domains, deduplicates by
/// normalized URL, and assigns 1-based ranks in order seen.
#[must_use]
pub fn extract_cited_links(payload: &Value) -> Vec<CitedLink> {
    const LINK_KEYS: &[&str] = &["citations", "sources", "links", "references"];

    let items = LINK_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array));
    let Some(items) = items else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();
    for item in items {
        if links.len() >= MAX_CITATIONS {
            break;
        }
        let (url, title) = match item {
            Value::String(s) => (s.as_str(), None),
            Value::Object(_) => {
                let url = ["url", "link", "href"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str));
                let Some(url) = url else { continue };
                let title = ["title", "name"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str))
                    .map(ToString::to_string);
                (url, title)
            }
            _ => continue,
        };

        if !is_content_url(url) {
            tracing::debug!(url, "dropping non-content citation link");
            continue;
        }
        if !seen.insert(dedup_key(url)) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let rank = (links.len() + 1) as u32;
        links.push(CitedLink {
            url: url.to_string(),
            title,
            rank,
        });
    }
    links
}

fn is_content_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return false;
    }
    let path = lower.split('#').next().unwrap_or(&lower);
    let path = path.split('?').next().unwrap_or(path);
    if BLOCKED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    let host = host_of(&lower);
    !BLOCKED_DOMAINS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{blocked}")))
}

fn host_of(url: &str) -> &str {
    let rest = url.split("://").nth(1).unwrap_or(url);
    let host_port = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    host_port.split(':').next().unwrap_or(host_port)
}

/// Dedup key: lowercase, fragment stripped, trailing slash trimmed.
fn dedup_key(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let no_frag = lower.split('#').next().unwrap_or(&lower);
    no_frag.trim_end_matches('/').to_string()
}
