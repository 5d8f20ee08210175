//! Domain normalization for identity comparison.
//!
//! Normalized domains are only ever compared; the original domain string is
//! what gets persisted.

use url::Url;

/// Extract and normalize the host from a URL or bare domain.
///
/// Adds a scheme when one is missing, lowercases, strips a leading `www.`
/// and any trailing root dot. Returns `None` for empty input, unparseable
/// input, or hosts without a dot (`localhost`, bare words).
#[must_use]
pub fn normalize_domain(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{trimmed}"))
    }
    .ok()?;

    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() || !host.contains('.') {
        return None;
    }

    Some(host.to_string())
}

/// True when `candidate` is `tracked` or one of its subdomains.
///
/// Both arguments must already be normalized with [`normalize_domain`].
#[must_use]
pub fn domain_matches(candidate: &str, tracked: &str) -> bool {
    if candidate.is_empty() || tracked.is_empty() {
        return false;
    }
    candidate == tracked
        || candidate
            .strip_suffix(tracked)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
