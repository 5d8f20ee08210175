//! Input shapes supplied by the upstream answer-analysis step.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::normalize_domain;
use crate::facts::UNTAGGED;
use crate::normalize::normalize_brand_name;
use crate::CoreError;

/// One brand extracted from one AI-generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub name: String,
    /// Website the answer associated with the brand, if any.
    #[serde(default)]
    pub domain: Option<String>,
    /// Result of the external existence check on `domain`.
    #[serde(default)]
    pub domain_verified: bool,
    /// 0–100; out-of-range values are clamped when facts are built.
    #[serde(default)]
    pub sentiment: Option<f64>,
    /// 1-based position in the answer's ranking.
    #[serde(default)]
    pub ranking_position: Option<i32>,
}

impl Mention {
    /// Identity slug for this mention.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMention`] when the name is blank or
    /// normalizes to an empty slug.
    pub fn identity_slug(&self) -> Result<String, CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidMention(
                "mention name is blank".to_string(),
            ));
        }
        let slug = normalize_brand_name(&self.name);
        if slug.is_empty() {
            return Err(CoreError::InvalidMention(format!(
                "mention name '{}' has no identity characters",
                self.name
            )));
        }
        Ok(slug)
    }

    /// Normalized domain hint, used only for comparison.
    #[must_use]
    pub fn normalized_domain(&self) -> Option<String> {
        self.domain.as_deref().and_then(normalize_domain)
    }

    /// Sentiment rounded and clamped into `0..=100`; `NaN` is dropped.
    #[must_use]
    pub fn sentiment_score(&self) -> Option<i16> {
        let raw = self.sentiment.filter(|s| !s.is_nan())?;
        #[allow(clippy::cast_possible_truncation)]
        let clamped = raw.round().clamp(0.0, 100.0) as i16;
        Some(clamped)
    }

    /// Ranking position, dropping non-positive values.
    #[must_use]
    pub fn valid_ranking(&self) -> Option<i32> {
        self.ranking_position.filter(|p| *p >= 1)
    }
}

/// An external reference cited by one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Explicit domain; derived from `url` when absent.
    #[serde(default)]
    pub domain: Option<String>,
}

impl Citation {
    #[must_use]
    pub fn normalized_domain(&self) -> Option<String> {
        self.domain
            .as_deref()
            .and_then(normalize_domain)
            .or_else(|| normalize_domain(&self.url))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub date: NaiveDate,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub response_length: Option<i32>,
}

/// Everything known about one analyzed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerContext {
    pub result_id: Uuid,
    /// The tracked website that owns the prompt.
    pub website_id: Uuid,
    /// Engine or channel that produced the answer.
    pub engine: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub metadata: AnswerMetadata,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl AnswerContext {
    /// Trimmed, de-duplicated tags in input order, or `["untagged"]`.
    #[must_use]
    pub fn effective_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        if tags.is_empty() {
            tags.push(UNTAGGED.to_string());
        }
        tags
    }
}

/// A validated mention enriched with its canonical identity and own-brand flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMention {
    pub mention: Mention,
    pub slug: String,
    pub canonical_brand_id: Option<Uuid>,
    pub is_own_brand: bool,
}
