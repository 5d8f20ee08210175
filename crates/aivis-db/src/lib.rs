//! Postgres persistence for canonical brands, analytics facts, and citations.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

// Path relative to crates/aivis-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Connection pool sizing, taken from [`aivis_core::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &aivis_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    InvalidMention(#[from] aivis_core::CoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    Ok(usize::try_from((applied_after - applied_before).max(0)).unwrap_or(0))
}

// _sqlx_migrations is absent on a fresh database; absence counts as zero.
async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

pub mod analytics_facts;
pub mod canonical_brands;
pub mod citations;

pub use analytics_facts::{
    list_facts_for_result, list_unresolved_facts, repair_fact_identity, write_answer_facts,
    AnalyticsFactRow, UnresolvedFactRow,
};
pub use canonical_brands::{
    add_additional_website, get_canonical_brand, get_canonical_brand_by_slug,
    list_canonical_brands, recorded_alias_names, resolve_canonical_brand,
    resolve_canonical_brands, CanonicalBrandRow,
};
pub use citations::{list_citations_for_result, CitationRow};
