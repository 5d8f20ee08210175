//! Brand name normalization.
//!
//! [`normalize_brand_name`] produces the canonical identity slug. It is the
//! only function any caller may use when two brand names have to agree on
//! identity: the writer that inserts a `canonical_brands` row, the resolver
//! that matches against existing slugs, the own-brand matcher, and the fact
//! expander that keys fact rows. [`display_slug`] is a separate, URL-facing
//! rendering and must never be compared against identity slugs.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing domain-style suffix: `acme.com` -> `acme`.
static DOMAIN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(com|io|ai|co|net|org|app|dev|tech|so|us|uk|xyz)$")
        .expect("valid domain suffix regex")
});

/// Trailing business-entity word: `acme, inc.` -> `acme`.
///
/// The suffix must be preceded by whitespace or a comma, so a bare `"Co"` or
/// `"App"` keeps its name.
static ENTITY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\s,]+(inc|llc|ltd|corp|corporation|co|company|gmbh|plc|software|platform|tools?|app|limited)\.?$",
    )
    .expect("valid entity suffix regex")
});

/// Convert a raw brand or company name into its canonical identity slug.
///
/// Lowercases, strips one trailing domain suffix, strips one trailing entity
/// suffix, drops every character that is not a letter, digit, or whitespace,
/// then collapses whitespace runs and trims. Total: returns an empty string
/// when nothing survives, which callers treat as an invalid mention.
#[must_use]
pub fn normalize_brand_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let without_domain = DOMAIN_SUFFIX.replace(&lower, "");
    let without_entity = ENTITY_SUFFIX.replace(&without_domain, "");

    let kept: String = without_entity
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL-safe, hyphenated slug for display and links (`"High Rise"` -> `"high-rise"`).
///
/// Not an identity key: `"Acme Inc"` and `"Acme"` produce different display
/// slugs but the same identity slug.
#[must_use]
pub fn display_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c.is_whitespace() {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
