//! Repair command handler for the CLI.

use aivis_core::{AppConfig, TrackedWebsitesFile};
use aivis_pipeline::{repair_unresolved, PgAnswerStore};

/// Re-run identity resolution for degraded fact rows and print a summary.
///
/// # Errors
///
/// Returns an error if listing or updating fact rows fails.
pub(crate) async fn run_repair(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    tracked: &TrackedWebsitesFile,
    limit: i64,
) -> anyhow::Result<()> {
    let store = PgAnswerStore::new(pool.clone());
    let summary = repair_unresolved(&store, tracked, limit, config.similarity_threshold).await?;

    println!(
        "repair: examined {}, repaired {} ({} row(s)), still unresolved {}",
        summary.examined, summary.repaired, summary.rows_updated, summary.unresolved
    );

    Ok(())
}
