//! Expansion of one analyzed answer into durable analytics fact rows.
//!
//! Fact rows are keyed on `(result_id, brand_slug, tag)`. Every function here
//! is pure; writing the rows is the store's job.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::domain_matches;
use crate::types::{AnswerContext, Citation, ResolvedMention};

/// Reserved `brand_slug` of the placeholder row for answers without mentions.
pub const NO_BRANDS_SLUG: &str = "no_brands";

/// Tag used when an answer carries no usable tags.
pub const UNTAGGED: &str = "untagged";

/// One analytics row: a (mention, tag) pair, or a per-tag placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactRow {
    pub result_id: Uuid,
    pub website_id: Uuid,
    pub fact_date: NaiveDate,
    pub engine: String,
    pub tag: String,
    pub brand_slug: String,
    pub canonical_brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub brand_website: Option<String>,
    pub is_own_brand: bool,
    /// `0` for placeholders, `1` otherwise.
    pub mention_count: i16,
    pub ranking_position: Option<i32>,
    pub sentiment_score: Option<i16>,
    pub total_citations: i32,
    pub own_brand_citations: i32,
    pub model: Option<String>,
    pub response_length: Option<i32>,
}

impl FactRow {
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.brand_slug == NO_BRANDS_SLUG
    }
}

/// A citation prepared for persistence alongside the answer's facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationRecord {
    pub url: String,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub is_own_website: bool,
}

/// Count prepared citations that point at the tracked website.
#[must_use]
pub fn own_brand_citations(records: &[CitationRecord]) -> i32 {
    let count = records.iter().filter(|r| r.is_own_website).count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Prepare the answer's citations for persistence, one record per distinct URL.
///
/// Blank URLs are dropped. A citation is own-website when its domain is the
/// normalized `tracked_domain` or one of its subdomains.
#[must_use]
pub fn classify_citations(
    citations: &[Citation],
    tracked_domain: Option<&str>,
) -> Vec<CitationRecord> {
    let mut records: Vec<CitationRecord> = Vec::with_capacity(citations.len());
    for citation in citations {
        let url = citation.url.trim();
        if url.is_empty() || records.iter().any(|r| r.url == url) {
            continue;
        }
        let domain = citation.normalized_domain();
        let is_own_website = match (domain.as_deref(), tracked_domain) {
            (Some(domain), Some(tracked)) => domain_matches(domain, tracked),
            _ => false,
        };
        records.push(CitationRecord {
            url: url.to_string(),
            title: citation.title.clone(),
            domain,
            is_own_website,
        });
    }
    records
}

/// Per-slug aggregate, so two spellings of one brand in the same answer
/// still produce a single row per tag.
struct BrandEntry<'a> {
    slug: &'a str,
    name: &'a str,
    website: Option<&'a str>,
    canonical_brand_id: Option<Uuid>,
    is_own_brand: bool,
    ranking_position: Option<i32>,
    sentiment_score: Option<i16>,
}

impl<'a> BrandEntry<'a> {
    fn new(resolved: &'a ResolvedMention) -> Self {
        Self {
            slug: &resolved.slug,
            name: &resolved.mention.name,
            website: resolved.mention.domain.as_deref(),
            canonical_brand_id: resolved.canonical_brand_id,
            is_own_brand: resolved.is_own_brand,
            ranking_position: resolved.mention.valid_ranking(),
            sentiment_score: resolved.mention.sentiment_score(),
        }
    }

    fn absorb(&mut self, resolved: &'a ResolvedMention) {
        self.website = self.website.or(resolved.mention.domain.as_deref());
        self.canonical_brand_id = self.canonical_brand_id.or(resolved.canonical_brand_id);
        self.is_own_brand |= resolved.is_own_brand;
        self.ranking_position = match (self.ranking_position, resolved.mention.valid_ranking()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.sentiment_score = self
            .sentiment_score
            .or(resolved.mention.sentiment_score());
    }
}

fn collapse_by_slug(mentions: &[ResolvedMention]) -> Vec<BrandEntry<'_>> {
    let mut entries: Vec<BrandEntry<'_>> = Vec::with_capacity(mentions.len());
    for resolved in mentions {
        match entries.iter_mut().find(|e| e.slug == resolved.slug) {
            Some(entry) => entry.absorb(resolved),
            None => entries.push(BrandEntry::new(resolved)),
        }
    }
    entries
}

/// Expand one answer into its full set of fact rows.
///
/// With no mentions, emits one placeholder row per tag (`brand_slug =
/// "no_brands"`, `mention_count = 0`, no identity, ranking, or sentiment) so
/// the answer still counts toward mention-rate denominators. Otherwise emits
/// one row per distinct brand slug per tag with `mention_count = 1`. The
/// citation counts are taken over [`classify_citations`], so they agree with
/// the stored citation rows, and are the same on every row of the answer.
#[must_use]
pub fn expand_answer_facts(
    answer: &AnswerContext,
    tracked_domain: Option<&str>,
    mentions: &[ResolvedMention],
) -> Vec<FactRow> {
    let tags = answer.effective_tags();
    let citations = classify_citations(&answer.citations, tracked_domain);
    let total_citations = i32::try_from(citations.len()).unwrap_or(i32::MAX);
    let own_citations = own_brand_citations(&citations);

    let base = |tag: &str| FactRow {
        result_id: answer.result_id,
        website_id: answer.website_id,
        fact_date: answer.metadata.date,
        engine: answer.engine.clone(),
        tag: tag.to_string(),
        brand_slug: NO_BRANDS_SLUG.to_string(),
        canonical_brand_id: None,
        brand_name: None,
        brand_website: None,
        is_own_brand: false,
        mention_count: 0,
        ranking_position: None,
        sentiment_score: None,
        total_citations,
        own_brand_citations: own_citations,
        model: answer.metadata.model.clone(),
        response_length: answer.metadata.response_length,
    };

    if mentions.is_empty() {
        return tags.iter().map(|tag| base(tag)).collect();
    }

    let entries = collapse_by_slug(mentions);
    let mut rows = Vec::with_capacity(entries.len() * tags.len());
    for entry in &entries {
        for tag in &tags {
            rows.push(FactRow {
                brand_slug: entry.slug.to_string(),
                canonical_brand_id: entry.canonical_brand_id,
                brand_name: Some(entry.name.to_string()),
                brand_website: entry.website.map(str::to_string),
                is_own_brand: entry.is_own_brand,
                mention_count: 1,
                ranking_position: entry.ranking_position,
                sentiment_score: entry.sentiment_score,
                ..base(tag)
            });
        }
    }
    rows
}

#[cfg(test)]
#[path = "facts_test.rs"]
mod tests;
