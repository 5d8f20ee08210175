//! Canonical brand matching rules.
//!
//! The store owns atomicity; this module owns the decisions: which existing
//! canonical brand a mention belongs to, and how a matched brand's alias
//! list changes. Both the Postgres store and in-memory test stores call
//! these functions so matching never diverges between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::normalize_domain;
use crate::similarity::slug_similarity;

/// One recorded spelling of a canonical brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandAlias {
    pub name: String,
    pub first_seen_at: DateTime<Utc>,
    pub mention_count: i64,
}

/// The slice of a canonical brand needed for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCandidate {
    pub id: Uuid,
    pub slug: String,
    pub website: Option<String>,
    pub additional_websites: Vec<String>,
}

impl CanonicalCandidate {
    fn normalized_website(&self) -> Option<String> {
        self.website.as_deref().and_then(normalize_domain)
    }
}

/// Which rule produced a match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    CanonicalWebsite,
    AdditionalWebsite,
    FuzzySlug,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::CanonicalWebsite => write!(f, "canonical_website"),
            MatchKind::AdditionalWebsite => write!(f, "additional_website"),
            MatchKind::FuzzySlug => write!(f, "fuzzy_slug"),
        }
    }
}

/// Find the canonical brand a mention belongs to.
///
/// `domain` must already be normalized. Rules are tried in strict priority
/// order across all candidates, stopping at the first rule that matches:
///
/// 1. `domain` equals a candidate's normalized canonical website.
/// 2. `domain` equals one of a candidate's normalized additional websites.
/// 3. The best-scoring candidate slug with similarity `>= threshold`, provided
///    the mention has no domain, the candidate has no website, or the two
///    normalized domains agree.
///
/// Returns the candidate index and the rule that matched, or `None` when a
/// new canonical brand should be created.
#[must_use]
pub fn find_canonical_match(
    candidates: &[CanonicalCandidate],
    slug: &str,
    domain: Option<&str>,
    threshold: f64,
) -> Option<(usize, MatchKind)> {
    if let Some(domain) = domain {
        if let Some(idx) = candidates
            .iter()
            .position(|c| c.normalized_website().as_deref() == Some(domain))
        {
            return Some((idx, MatchKind::CanonicalWebsite));
        }

        if let Some(idx) = candidates.iter().position(|c| {
            c.additional_websites
                .iter()
                .filter_map(|w| normalize_domain(w))
                .any(|w| w == domain)
        }) {
            return Some((idx, MatchKind::AdditionalWebsite));
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = slug_similarity(slug, &candidate.slug);
        if score < threshold {
            continue;
        }

        let domains_compatible = match (domain, candidate.normalized_website()) {
            (None, _) | (_, None) => true,
            (Some(mention_domain), Some(candidate_domain)) => mention_domain == candidate_domain,
        };
        if !domains_compatible {
            continue;
        }

        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }

    best.map(|(idx, _)| (idx, MatchKind::FuzzySlug))
}

/// Seed alias list for a newly created canonical brand.
#[must_use]
pub fn initial_aliases(name: &str, now: DateTime<Utc>) -> Vec<BrandAlias> {
    vec![BrandAlias {
        name: name.to_string(),
        first_seen_at: now,
        mention_count: 1,
    }]
}

/// Record one more sighting of `name` on a matched brand.
///
/// An existing alias with the exact same spelling gets its count bumped; a
/// name equal to `canonical_name` that predates alias tracking is left alone;
/// anything else is appended. Returns `true` when a new alias was appended.
pub fn record_alias(
    aliases: &mut Vec<BrandAlias>,
    canonical_name: &str,
    name: &str,
    now: DateTime<Utc>,
) -> bool {
    if let Some(existing) = aliases.iter_mut().find(|a| a.name == name) {
        existing.mention_count = existing.mention_count.saturating_add(1);
        return false;
    }

    if name == canonical_name {
        return false;
    }

    aliases.push(BrandAlias {
        name: name.to_string(),
        first_seen_at: now,
        mention_count: 1,
    });
    true
}
