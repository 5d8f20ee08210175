//! The persistence seam of answer processing.
//!
//! Each job gets its own store handle; nothing here is global. The Postgres
//! implementation delegates to `aivis-db`, and tests substitute an in-memory
//! store that applies the same matching rules from `aivis-core`.

use aivis_core::{CitationRecord, FactRow, Mention};
use aivis_db::UnresolvedFactRow;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PipelineError;

#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Batched canonical resolution, one entry per input mention in order.
    async fn resolve_canonical_brands(
        &self,
        mentions: &[Mention],
        threshold: f64,
    ) -> Result<Vec<Option<Uuid>>, PipelineError>;

    /// Names recorded on the canonical brand with this identity slug.
    async fn recorded_aliases(&self, slug: &str) -> Result<Vec<String>, PipelineError>;

    /// Replace the fact and citation set of one answer. Returns rows written.
    async fn write_answer_facts(
        &self,
        result_id: Uuid,
        facts: &[FactRow],
        citations: &[CitationRecord],
    ) -> Result<usize, PipelineError>;

    async fn unresolved_facts(&self, limit: i64) -> Result<Vec<UnresolvedFactRow>, PipelineError>;

    async fn repair_fact_identity(
        &self,
        result_id: Uuid,
        brand_slug: &str,
        canonical_brand_id: Uuid,
        is_own_brand: bool,
    ) -> Result<u64, PipelineError>;
}

/// [`AnswerStore`] backed by the shared Postgres pool.
#[derive(Debug, Clone)]
pub struct PgAnswerStore {
    pool: PgPool,
}

impl PgAnswerStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerStore for PgAnswerStore {
    async fn resolve_canonical_brands(
        &self,
        mentions: &[Mention],
        threshold: f64,
    ) -> Result<Vec<Option<Uuid>>, PipelineError> {
        Ok(aivis_db::resolve_canonical_brands(&self.pool, mentions, threshold).await?)
    }

    async fn recorded_aliases(&self, slug: &str) -> Result<Vec<String>, PipelineError> {
        Ok(aivis_db::recorded_alias_names(&self.pool, slug).await?)
    }

    async fn write_answer_facts(
        &self,
        result_id: Uuid,
        facts: &[FactRow],
        citations: &[CitationRecord],
    ) -> Result<usize, PipelineError> {
        Ok(aivis_db::write_answer_facts(&self.pool, result_id, facts, citations).await?)
    }

    async fn unresolved_facts(&self, limit: i64) -> Result<Vec<UnresolvedFactRow>, PipelineError> {
        Ok(aivis_db::list_unresolved_facts(&self.pool, limit).await?)
    }

    async fn repair_fact_identity(
        &self,
        result_id: Uuid,
        brand_slug: &str,
        canonical_brand_id: Uuid,
        is_own_brand: bool,
    ) -> Result<u64, PipelineError> {
        Ok(aivis_db::repair_fact_identity(
            &self.pool,
            result_id,
            brand_slug,
            canonical_brand_id,
            is_own_brand,
        )
        .await?)
    }
}
