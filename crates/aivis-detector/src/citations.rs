//! Citation URL extraction and normalization.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use aivis_core::{BrandConfig, CitationRecord, CitedLink};

/// Query parameters stripped during normalization. `utm_` matches as a
/// prefix; the rest match exactly.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "igshid", "mc_cid", "mc_eid", "ref", "ref_src",
];

/// A URL after normalization, with its matching domain split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub url: String,
    /// Lowercased host without any `www.` prefix or port.
    pub domain: String,
}

/// Normalize a citation URL.
///
/// Lowercases the scheme and host, strips a leading `www.`, drops the
/// fragment, and removes tracking query parameters. Only `http` and
/// `https` URLs are accepted; anything unparseable yields `None` and is
/// skipped by the caller rather than treated as fatal.
#[must_use]
pub fn normalize_url(raw: &str) -> Option<NormalizedUrl> {
    let raw = raw.trim();
    let (scheme, rest) = raw.split_once("://")?;
    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return None;
    }

    let rest = rest.split('#').next().unwrap_or(rest);
    let (host_port, path_and_query) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };

    // Drop any userinfo; it never identifies the cited content.
    let host_port = host_port.rsplit('@').next().unwrap_or(host_port);
    if host_port.is_empty() {
        return None;
    }

    let (host, port) = match host_port.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => {
            (h, Some(p))
        }
        _ => (host_port, None),
    };
    let host = host.to_ascii_lowercase();
    if host.is_empty() || (!host.contains('.') && host != "localhost") {
        return None;
    }

    let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();

    let (path, query) = match path_and_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_and_query, None),
    };

    let kept_query = query.map(|q| {
        q.split('&')
            .filter(|pair| !pair.is_empty() && !is_tracking_param(pair))
            .collect::<Vec<_>>()
            .join("&")
    });

    let mut url = format!("{scheme}://{host}");
    if let Some(port) = port {
        url.push(':');
        url.push_str(port);
    }
    url.push_str(path);
    if let Some(q) = kept_query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&q);
    }

    Some(NormalizedUrl { url, domain })
}

fn is_tracking_param(pair: &str) -> bool {
    let name = pair.split('=').next().unwrap_or(pair).to_ascii_lowercase();
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name.as_str())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"')\]]+"#).unwrap())
}

/// Find URLs embedded in answer prose, in order of appearance, with
/// trailing sentence punctuation trimmed.
#[must_use]
pub fn extract_urls_from_text(text: &str) -> Vec<String> {
    url_re()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']).to_string())
        .collect()
}

/// True when `domain` is the owned domain or one of its subdomains.
fn matches_owned(domain: &str, owned: &str) -> bool {
    let owned = owned.to_ascii_lowercase();
    let owned = owned.strip_prefix("www.").unwrap_or(&owned);
    domain == owned || domain.ends_with(&format!(".{owned}"))
}

/// Build normalized citation records from an answer.
///
/// Unions the engine-reported links with URLs pattern-matched from the
/// answer text (engine links first, preserving their order), deduplicates
/// by normalized URL, and re-assigns 1-based ranks in that order.
/// Malformed URLs are skipped.
#[must_use]
pub fn build_citation_records(
    cited_links: &[CitedLink],
    answer_text: &str,
    brands: &[BrandConfig],
) -> Vec<CitationRecord> {
    let owned_domains: Vec<&str> = brands
        .iter()
        .filter_map(|b| b.owned_domain.as_deref())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    let explicit = cited_links
        .iter()
        .map(|link| (link.url.as_str(), link.title.clone()));
    let in_text = extract_urls_from_text(answer_text);
    let found = in_text.iter().map(|url| (url.as_str(), None));

    for (raw_url, title) in explicit.chain(found) {
        let Some(normalized) = normalize_url(raw_url) else {
            tracing::debug!(url = raw_url, "skipping malformed citation URL");
            continue;
        };
        if !seen.insert(normalized.url.clone()) {
            continue;
        }
        let is_primary = owned_domains
            .iter()
            .any(|owned| matches_owned(&normalized.domain, owned));
        #[allow(clippy::cast_possible_truncation)]
        let rank = (records.len() + 1) as u32;
        records.push(CitationRecord {
            url: normalized.url,
            domain: normalized.domain,
            title,
            rank,
            is_primary,
        });
    }

    records
}
