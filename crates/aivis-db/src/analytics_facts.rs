//! Database operations for the `analytics_facts` table.
//!
//! Rows are keyed on `(result_id, brand_slug, tag)`. Writing an answer's
//! facts replaces that answer's row set in one transaction, so a redelivered
//! job leaves exactly the rows of its last run.

use aivis_core::{CitationRecord, FactRow};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::citations::replace_answer_citations;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `analytics_facts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsFactRow {
    pub id: i64,
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
    pub mention_count: i16,
    pub ranking_position: Option<i32>,
    pub sentiment_score: Option<i16>,
    pub total_citations: i32,
    pub own_brand_citations: i32,
    pub model: Option<String>,
    pub response_length: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One degraded brand within one answer: a real mention written without a
/// canonical identity. All tags of the pair are repaired together.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnresolvedFactRow {
    pub result_id: Uuid,
    pub website_id: Uuid,
    pub brand_slug: String,
    pub brand_name: Option<String>,
    pub brand_website: Option<String>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Persist the complete fact set and citation set for one answer.
///
/// Every row is upserted on `(result_id, brand_slug, tag)`; rows of the same
/// answer whose key is not in `facts` (for example the placeholders of an
/// earlier run without mentions) are deleted in the same transaction.
/// Returns the number of fact rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is committed in
/// that case.
pub async fn write_answer_facts(
    pool: &PgPool,
    result_id: Uuid,
    facts: &[FactRow],
    citations: &[CitationRecord],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for fact in facts {
        sqlx::query(
            "INSERT INTO analytics_facts \
                 (result_id, website_id, fact_date, engine, tag, brand_slug, \
                  canonical_brand_id, brand_name, brand_website, is_own_brand, \
                  mention_count, ranking_position, sentiment_score, total_citations, \
                  own_brand_citations, model, response_length) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT ON CONSTRAINT analytics_facts_identity_key DO UPDATE \
             SET website_id          = EXCLUDED.website_id, \
                 fact_date           = EXCLUDED.fact_date, \
                 engine              = EXCLUDED.engine, \
                 canonical_brand_id  = EXCLUDED.canonical_brand_id, \
                 brand_name          = EXCLUDED.brand_name, \
                 brand_website       = EXCLUDED.brand_website, \
                 is_own_brand        = EXCLUDED.is_own_brand, \
                 mention_count       = EXCLUDED.mention_count, \
                 ranking_position    = EXCLUDED.ranking_position, \
                 sentiment_score     = EXCLUDED.sentiment_score, \
                 total_citations     = EXCLUDED.total_citations, \
                 own_brand_citations = EXCLUDED.own_brand_citations, \
                 model               = EXCLUDED.model, \
                 response_length     = EXCLUDED.response_length, \
                 updated_at          = NOW()",
        )
        .bind(result_id)
        .bind(fact.website_id)
        .bind(fact.fact_date)
        .bind(&fact.engine)
        .bind(&fact.tag)
        .bind(&fact.brand_slug)
        .bind(fact.canonical_brand_id)
        .bind(fact.brand_name.as_deref())
        .bind(fact.brand_website.as_deref())
        .bind(fact.is_own_brand)
        .bind(fact.mention_count)
        .bind(fact.ranking_position)
        .bind(fact.sentiment_score)
        .bind(fact.total_citations)
        .bind(fact.own_brand_citations)
        .bind(fact.model.as_deref())
        .bind(fact.response_length)
        .execute(&mut *tx)
        .await?;
    }

    let slugs: Vec<&str> = facts.iter().map(|f| f.brand_slug.as_str()).collect();
    let tags: Vec<&str> = facts.iter().map(|f| f.tag.as_str()).collect();
    let removed = sqlx::query(
        "DELETE FROM analytics_facts \
         WHERE result_id = $1 \
           AND (brand_slug, tag) NOT IN ( \
               SELECT s, t FROM UNNEST($2::text[], $3::text[]) AS keep(s, t) \
           )",
    )
    .bind(result_id)
    .bind(&slugs)
    .bind(&tags)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed > 0 {
        tracing::debug!(%result_id, removed, "removed stale fact rows");
    }

    replace_answer_citations(&mut *tx, result_id, citations).await?;

    tx.commit().await?;
    Ok(facts.len())
}

/// Attach a canonical identity to every tag row of one degraded brand.
///
/// Only rows still lacking an identity are touched, so a concurrent fresh
/// write of the same answer is never overwritten. Returns rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn repair_fact_identity(
    pool: &PgPool,
    result_id: Uuid,
    brand_slug: &str,
    canonical_brand_id: Uuid,
    is_own_brand: bool,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE analytics_facts \
         SET canonical_brand_id = $3, \
             is_own_brand       = is_own_brand OR $4, \
             updated_at         = NOW() \
         WHERE result_id = $1 \
           AND brand_slug = $2 \
           AND canonical_brand_id IS NULL \
           AND mention_count = 1",
    )
    .bind(result_id)
    .bind(brand_slug)
    .bind(canonical_brand_id)
    .bind(is_own_brand)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all fact rows of one answer ordered by slug, then tag.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_facts_for_result(
    pool: &PgPool,
    result_id: Uuid,
) -> Result<Vec<AnalyticsFactRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalyticsFactRow>(
        "SELECT id, result_id, website_id, fact_date, engine, tag, brand_slug, \
                canonical_brand_id, brand_name, brand_website, is_own_brand, mention_count, \
                ranking_position, sentiment_score, total_citations, own_brand_citations, \
                model, response_length, created_at, updated_at \
         FROM analytics_facts \
         WHERE result_id = $1 \
         ORDER BY brand_slug, tag",
    )
    .bind(result_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` degraded (result, brand) pairs, oldest first.
///
/// Placeholder rows carry no identity by definition and are excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unresolved_facts(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UnresolvedFactRow>, DbError> {
    let rows = sqlx::query_as::<_, UnresolvedFactRow>(
        "SELECT result_id, website_id, brand_slug, brand_name, brand_website \
         FROM ( \
             SELECT DISTINCT ON (result_id, brand_slug) \
                    result_id, website_id, brand_slug, brand_name, brand_website, created_at \
             FROM analytics_facts \
             WHERE canonical_brand_id IS NULL AND mention_count = 1 \
             ORDER BY result_id, brand_slug, created_at \
         ) pending \
         ORDER BY created_at \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
