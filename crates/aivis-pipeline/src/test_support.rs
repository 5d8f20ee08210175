//! In-memory [`AnswerStore`] for orchestration tests.

use std::sync::Mutex;

use aivis_core::{
    find_canonical_match, initial_aliases, record_alias, BrandAlias, CanonicalCandidate,
    CitationRecord, FactRow, Mention, TrackedWebsite,
};
use aivis_db::{DbError, UnresolvedFactRow};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::store::AnswerStore;

#[derive(Debug, Clone)]
pub(crate) struct MemoryBrand {
    pub candidate: CanonicalCandidate,
    pub name: String,
    pub aliases: Vec<BrandAlias>,
    pub total_mentions: i64,
    pub domain_verified: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub brands: Mutex<Vec<MemoryBrand>>,
    pub facts: Mutex<Vec<FactRow>>,
    pub citations: Mutex<Vec<(Uuid, CitationRecord)>>,
    pub fail_resolve: bool,
    pub truncate_resolve: bool,
    pub fail_alias_lookup: bool,
    pub fail_write: bool,
}

fn transient() -> PipelineError {
    PipelineError::Store(DbError::Sqlx(sqlx::Error::PoolTimedOut))
}

impl MemoryStore {
    pub fn fact_rows(&self) -> Vec<FactRow> {
        self.facts.lock().unwrap().clone()
    }

    pub fn brand_count(&self) -> usize {
        self.brands.lock().unwrap().len()
    }

    pub fn brand(&self, slug: &str) -> Option<MemoryBrand> {
        self.brands
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.candidate.slug == slug)
            .cloned()
    }

    fn resolve_one(
        brands: &mut Vec<MemoryBrand>,
        mention: &Mention,
        threshold: f64,
    ) -> Option<Uuid> {
        let slug = mention.identity_slug().ok()?;
        let domain = mention.normalized_domain();
        let candidates: Vec<CanonicalCandidate> =
            brands.iter().map(|b| b.candidate.clone()).collect();
        let now = Utc::now();

        let idx = find_canonical_match(&candidates, &slug, domain.as_deref(), threshold)
            .map(|(idx, _)| idx)
            .or_else(|| brands.iter().position(|b| b.candidate.slug == slug));

        let Some(idx) = idx else {
            let id = Uuid::new_v4();
            brands.push(MemoryBrand {
                candidate: CanonicalCandidate {
                    id,
                    slug,
                    website: domain,
                    additional_websites: vec![],
                },
                name: mention.name.trim().to_string(),
                aliases: initial_aliases(mention.name.trim(), now),
                total_mentions: 1,
                domain_verified: mention.domain_verified,
            });
            return Some(id);
        };

        let brand = &mut brands[idx];
        record_alias(&mut brand.aliases, &brand.name, mention.name.trim(), now);
        brand.total_mentions += 1;
        brand.domain_verified |= mention.domain_verified;
        if brand.candidate.website.is_none() {
            brand.candidate.website = domain;
        }
        Some(brand.candidate.id)
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn resolve_canonical_brands(
        &self,
        mentions: &[Mention],
        threshold: f64,
    ) -> Result<Vec<Option<Uuid>>, PipelineError> {
        if self.fail_resolve {
            return Err(transient());
        }
        let mut brands = self.brands.lock().unwrap();
        let mut ids: Vec<Option<Uuid>> = mentions
            .iter()
            .map(|m| Self::resolve_one(&mut brands, m, threshold))
            .collect();
        if self.truncate_resolve {
            ids.pop();
        }
        Ok(ids)
    }

    async fn recorded_aliases(&self, slug: &str) -> Result<Vec<String>, PipelineError> {
        if self.fail_alias_lookup {
            return Err(transient());
        }
        let brands = self.brands.lock().unwrap();
        Ok(brands
            .iter()
            .find(|b| b.candidate.slug == slug)
            .map(|b| {
                std::iter::once(b.name.clone())
                    .chain(b.aliases.iter().map(|a| a.name.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn write_answer_facts(
        &self,
        result_id: Uuid,
        facts: &[FactRow],
        citations: &[CitationRecord],
    ) -> Result<usize, PipelineError> {
        if self.fail_write {
            return Err(transient());
        }
        let mut stored = self.facts.lock().unwrap();
        stored.retain(|f| f.result_id != result_id);
        stored.extend(facts.iter().cloned());

        let mut stored_citations = self.citations.lock().unwrap();
        stored_citations.retain(|(id, _)| *id != result_id);
        stored_citations.extend(citations.iter().cloned().map(|c| (result_id, c)));
        Ok(facts.len())
    }

    async fn unresolved_facts(&self, limit: i64) -> Result<Vec<UnresolvedFactRow>, PipelineError> {
        let stored = self.facts.lock().unwrap();
        let mut pending: Vec<UnresolvedFactRow> = Vec::new();
        for fact in stored
            .iter()
            .filter(|f| f.canonical_brand_id.is_none() && f.mention_count == 1)
        {
            let seen = pending
                .iter()
                .any(|p| p.result_id == fact.result_id && p.brand_slug == fact.brand_slug);
            if !seen {
                pending.push(UnresolvedFactRow {
                    result_id: fact.result_id,
                    website_id: fact.website_id,
                    brand_slug: fact.brand_slug.clone(),
                    brand_name: fact.brand_name.clone(),
                    brand_website: fact.brand_website.clone(),
                });
            }
        }
        pending.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(pending)
    }

    async fn repair_fact_identity(
        &self,
        result_id: Uuid,
        brand_slug: &str,
        canonical_brand_id: Uuid,
        is_own_brand: bool,
    ) -> Result<u64, PipelineError> {
        let mut stored = self.facts.lock().unwrap();
        let mut updated = 0;
        for fact in stored.iter_mut().filter(|f| {
            f.result_id == result_id
                && f.brand_slug == brand_slug
                && f.canonical_brand_id.is_none()
                && f.mention_count == 1
        }) {
            fact.canonical_brand_id = Some(canonical_brand_id);
            fact.is_own_brand |= is_own_brand;
            updated += 1;
        }
        Ok(updated)
    }
}

pub(crate) fn acme_website() -> TrackedWebsite {
    TrackedWebsite {
        id: Uuid::parse_str("0e6a3c55-7f5b-4d8e-8f43-6a5d9d1c2b33").unwrap(),
        name: "Acme".to_string(),
        domain: "acme.com".to_string(),
        aliases: vec!["Acme Corp".to_string(), "ACME Widgets".to_string()],
    }
}
