//! Database operations for the `answer_citations` table.

use aivis_core::CitationRecord;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A row from the `answer_citations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationRow {
    pub id: i64,
    pub result_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub is_own_website: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Replace the stored citation set of one answer with `citations`.
///
/// Upserts on `(result_id, url)` and removes URLs no longer cited. Runs on the
/// caller's connection so it can share the fact-write transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub(crate) async fn replace_answer_citations(
    conn: &mut PgConnection,
    result_id: Uuid,
    citations: &[CitationRecord],
) -> Result<(), DbError> {
    for citation in citations {
        sqlx::query(
            "INSERT INTO answer_citations (result_id, url, title, domain, is_own_website) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT ON CONSTRAINT answer_citations_result_url_key DO UPDATE \
             SET title          = EXCLUDED.title, \
                 domain         = EXCLUDED.domain, \
                 is_own_website = EXCLUDED.is_own_website, \
                 updated_at     = NOW()",
        )
        .bind(result_id)
        .bind(&citation.url)
        .bind(citation.title.as_deref())
        .bind(citation.domain.as_deref())
        .bind(citation.is_own_website)
        .execute(&mut *conn)
        .await?;
    }

    let urls: Vec<&str> = citations.iter().map(|c| c.url.as_str()).collect();
    sqlx::query("DELETE FROM answer_citations WHERE result_id = $1 AND NOT (url = ANY($2))")
        .bind(result_id)
        .bind(&urls)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Returns the stored citations of one answer, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_citations_for_result(
    pool: &PgPool,
    result_id: Uuid,
) -> Result<Vec<CitationRow>, DbError> {
    let rows = sqlx::query_as::<_, CitationRow>(
        "SELECT id, result_id, url, title, domain, is_own_website, created_at, updated_at \
         FROM answer_citations \
         WHERE result_id = $1 \
         ORDER BY id",
    )
    .bind(result_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
