//! Database operations for the `canonical_brands` table.
//!
//! Resolution runs one short transaction per mention that touches exactly
//! one row, so concurrent workers never hold locks on two brands at once.
//! A mention that matches nothing in the batch snapshot takes a
//! transaction-scoped advisory lock shared by all creators, re-runs the match
//! against the committed rows, and only then inserts. Two workers seeing a new
//! brand under different spellings or the same website therefore converge on
//! one row. The insert itself is `INSERT ... ON CONFLICT (canonical_slug) DO
//! NOTHING` followed by a locking read-back of the winner's row.

use aivis_core::{
    find_canonical_match, initial_aliases, normalize_domain, record_alias, BrandAlias,
    CanonicalCandidate, Mention,
};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::DbError;

/// Advisory lock key held by every transaction that may create a canonical
/// brand.
const CREATE_LOCK_KEY: i64 = 0x6169_7669_735f_6362;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `canonical_brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CanonicalBrandRow {
    pub id: Uuid,
    pub canonical_name: String,
    pub canonical_slug: String,
    pub canonical_website: Option<String>,
    pub additional_websites: Vec<String>,
    pub aliases: Json<Vec<BrandAlias>>,
    pub domain_verified: bool,
    pub total_mentions: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CanonicalBrandRow {
    #[must_use]
    pub fn candidate(&self) -> CanonicalCandidate {
        CanonicalCandidate {
            id: self.id,
            slug: self.canonical_slug.clone(),
            website: self.canonical_website.clone(),
            additional_websites: self.additional_websites.clone(),
        }
    }
}

/// Domain hint worth persisting: the trimmed original string, only when it
/// normalizes to a usable domain.
fn persistable_domain(mention: &Mention) -> Option<String> {
    let raw = mention.domain.as_deref()?.trim();
    normalize_domain(raw).map(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve one mention to its canonical brand id, creating the brand if needed.
///
/// # Errors
///
/// Returns [`DbError::InvalidMention`] if the name has no identity
/// characters, or [`DbError::Sqlx`] if the store fails. Concurrent creation
/// of the same slug is never an error.
pub async fn resolve_canonical_brand(
    pool: &PgPool,
    mention: &Mention,
    threshold: f64,
) -> Result<Uuid, DbError> {
    let slug = mention.identity_slug()?;
    let candidates = load_candidates(pool).await?;
    let row = resolve_against(pool, &candidates, mention, &slug, threshold).await?;
    Ok(row.id)
}

/// Resolve a batch of mentions, preserving input order.
///
/// The candidate set is read once per batch and extended with brands created
/// along the way, so two spellings of a new brand in one answer land on the
/// same row. Invalid mentions and per-mention store failures yield `None`
/// for that entry and are logged; the rest of the batch continues.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the candidate set cannot be loaded.
pub async fn resolve_canonical_brands(
    pool: &PgPool,
    mentions: &[Mention],
    threshold: f64,
) -> Result<Vec<Option<Uuid>>, DbError> {
    if mentions.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates = load_candidates(pool).await?;
    let mut ids = Vec::with_capacity(mentions.len());

    for mention in mentions {
        let slug = match mention.identity_slug() {
            Ok(slug) => slug,
            Err(e) => {
                tracing::warn!(name = %mention.name, error = %e, "skipping invalid mention");
                ids.push(None);
                continue;
            }
        };

        match resolve_against(pool, &candidates, mention, &slug, threshold).await {
            Ok(row) => {
                let candidate = row.candidate();
                match candidates.iter_mut().find(|c| c.id == candidate.id) {
                    Some(existing) => *existing = candidate,
                    None => candidates.push(candidate),
                }
                ids.push(Some(row.id));
            }
            Err(e) => {
                tracing::warn!(
                    slug = %slug,
                    error = %e,
                    "canonical resolution failed for mention"
                );
                ids.push(None);
            }
        }
    }

    Ok(ids)
}

async fn load_candidates<'e, E>(executor: E) -> Result<Vec<CanonicalCandidate>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, (Uuid, String, Option<String>, Vec<String>)>(
        "SELECT id, canonical_slug, canonical_website, additional_websites \
         FROM canonical_brands",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, slug, website, additional_websites)| CanonicalCandidate {
            id,
            slug,
            website,
            additional_websites,
        })
        .collect())
}

async fn resolve_against(
    pool: &PgPool,
    candidates: &[CanonicalCandidate],
    mention: &Mention,
    slug: &str,
    threshold: f64,
) -> Result<CanonicalBrandRow, DbError> {
    let domain = mention.normalized_domain();
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let matched = find_canonical_match(candidates, slug, domain.as_deref(), threshold)
        .map(|(idx, kind)| (candidates[idx].id, kind));
    let existing = match matched {
        Some((id, kind)) => {
            tracing::debug!(slug, %id, match_kind = %kind, "matched canonical brand");
            lock_by_id(&mut tx, id).await?
        }
        None => None,
    };

    let row = match existing {
        Some(existing) => record_sighting(&mut tx, existing, mention, now).await?,
        None => create_if_absent(&mut tx, mention, slug, domain.as_deref(), threshold, now).await?,
    };

    tx.commit().await?;
    Ok(row)
}

/// Serialize creators, then repeat the match against every committed row
/// before inserting. Brands committed by another worker since the batch
/// snapshot was read are found here instead of being duplicated.
async fn create_if_absent(
    conn: &mut PgConnection,
    mention: &Mention,
    slug: &str,
    domain: Option<&str>,
    threshold: f64,
    now: DateTime<Utc>,
) -> Result<CanonicalBrandRow, DbError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CREATE_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    let committed = load_candidates(&mut *conn).await?;
    if let Some((idx, kind)) = find_canonical_match(&committed, slug, domain, threshold) {
        let id = committed[idx].id;
        if let Some(existing) = lock_by_id(conn, id).await? {
            tracing::debug!(
                slug,
                %id,
                match_kind = %kind,
                "converged on concurrently created brand"
            );
            return record_sighting(conn, existing, mention, now).await;
        }
    }

    create_or_converge(conn, mention, slug, now).await
}

/// Insert a new canonical brand for `slug`, or fold this mention into the
/// row a concurrent worker inserted first.
async fn create_or_converge(
    conn: &mut PgConnection,
    mention: &Mention,
    slug: &str,
    now: DateTime<Utc>,
) -> Result<CanonicalBrandRow, DbError> {
    let inserted = sqlx::query_as::<_, CanonicalBrandRow>(
        "INSERT INTO canonical_brands \
             (id, canonical_name, canonical_slug, canonical_website, aliases, \
              domain_verified, total_mentions, first_seen_at, last_seen_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $7) \
         ON CONFLICT (canonical_slug) DO NOTHING \
         RETURNING id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                   aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                   created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(mention.name.trim())
    .bind(slug)
    .bind(persistable_domain(mention))
    .bind(Json(initial_aliases(mention.name.trim(), now)))
    .bind(mention.domain_verified)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = inserted {
        tracing::info!(slug, id = %row.id, "created canonical brand");
        return Ok(row);
    }

    tracing::debug!(slug, "canonical slug already exists; converging on existing row");
    let existing = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         WHERE canonical_slug = $1 \
         FOR UPDATE",
    )
    .bind(slug)
    .fetch_one(&mut *conn)
    .await?;

    record_sighting(conn, existing, mention, now).await
}

async fn lock_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<CanonicalBrandRow>, DbError> {
    let row = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         WHERE id = $1 \
         FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Apply one matched mention to a locked row: alias bookkeeping, counter
/// bump, `last_seen_at`, monotonic verification, and website backfill.
async fn record_sighting(
    conn: &mut PgConnection,
    existing: CanonicalBrandRow,
    mention: &Mention,
    now: DateTime<Utc>,
) -> Result<CanonicalBrandRow, DbError> {
    let mut aliases = existing.aliases.0;
    record_alias(&mut aliases, &existing.canonical_name, mention.name.trim(), now);

    let row = sqlx::query_as::<_, CanonicalBrandRow>(
        "UPDATE canonical_brands \
         SET aliases           = $2, \
             total_mentions    = total_mentions + 1, \
             last_seen_at      = GREATEST(last_seen_at, $3), \
             domain_verified   = domain_verified OR $4, \
             canonical_website = COALESCE(canonical_website, $5), \
             updated_at        = NOW() \
         WHERE id = $1 \
         RETURNING id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                   aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                   created_at, updated_at",
    )
    .bind(existing.id)
    .bind(Json(aliases))
    .bind(now)
    .bind(mention.domain_verified)
    .bind(persistable_domain(mention))
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a canonical brand by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_canonical_brand(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CanonicalBrandRow>, DbError> {
    let row = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a canonical brand by identity slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_canonical_brand_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<CanonicalBrandRow>, DbError> {
    let row = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         WHERE canonical_slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns canonical brands ordered by `total_mentions DESC`, then slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_canonical_brands(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CanonicalBrandRow>, DbError> {
    let rows = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         ORDER BY total_mentions DESC, canonical_slug \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Names recorded for the canonical brand with this slug (canonical name
/// first, then aliases). Empty when the brand has never been seen.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recorded_alias_names(pool: &PgPool, slug: &str) -> Result<Vec<String>, DbError> {
    let Some(row) = get_canonical_brand_by_slug(pool, slug).await? else {
        return Ok(Vec::new());
    };

    let mut names = vec![row.canonical_name.clone()];
    for alias in row.aliases.0 {
        if !names.contains(&alias.name) {
            names.push(alias.name);
        }
    }
    Ok(names)
}

/// Adds a secondary website to a canonical brand's `additional_websites`.
///
/// Invalid domains, and domains that normalize to the canonical website or an
/// existing secondary website, leave the row unchanged. Returns the (possibly
/// unchanged) row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has this slug, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn add_additional_website(
    pool: &PgPool,
    slug: &str,
    website: &str,
) -> Result<CanonicalBrandRow, DbError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, CanonicalBrandRow>(
        "SELECT id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                created_at, updated_at \
         FROM canonical_brands \
         WHERE canonical_slug = $1 \
         FOR UPDATE",
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let Some(normalized) = normalize_domain(website) else {
        tx.commit().await?;
        return Ok(existing);
    };
    let already_known = existing
        .canonical_website
        .iter()
        .chain(existing.additional_websites.iter())
        .any(|w| normalize_domain(w).as_deref() == Some(normalized.as_str()));

    if already_known {
        tx.commit().await?;
        return Ok(existing);
    }

    let row = sqlx::query_as::<_, CanonicalBrandRow>(
        "UPDATE canonical_brands \
         SET additional_websites = array_append(additional_websites, $2), \
             updated_at          = NOW() \
         WHERE id = $1 \
         RETURNING id, canonical_name, canonical_slug, canonical_website, additional_websites, \
                   aliases, domain_verified, total_mentions, first_seen_at, last_seen_at, \
                   created_at, updated_at",
    )
    .bind(existing.id)
    .bind(website.trim())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
