//! Maintenance pass for facts written without a canonical identity.

use aivis_core::{Mention, TrackedWebsitesFile};
use serde::Serialize;

use crate::error::PipelineError;
use crate::own_brand::match_own_brand;
use crate::store::AnswerStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Degraded (answer, brand) pairs examined.
    pub examined: usize,
    /// Pairs that received a canonical identity.
    pub repaired: usize,
    /// Fact rows updated across all tags.
    pub rows_updated: u64,
    /// Pairs that still could not be resolved.
    pub unresolved: usize,
}

/// Re-run canonical resolution and own-brand matching for up to `limit`
/// degraded (answer, brand) pairs and attach the results in place.
///
/// A pair that still fails to resolve is counted and left for a later pass.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if listing or updating fact rows fails.
pub async fn repair_unresolved<S>(
    store: &S,
    tracked: &TrackedWebsitesFile,
    limit: i64,
    threshold: f64,
) -> Result<RepairSummary, PipelineError>
where
    S: AnswerStore + ?Sized,
{
    let pending = store.unresolved_facts(limit).await?;
    let mut summary = RepairSummary {
        examined: pending.len(),
        ..RepairSummary::default()
    };

    for row in pending {
        let Some(name) = row.brand_name.clone() else {
            summary.unresolved += 1;
            continue;
        };
        let mention = Mention {
            name,
            domain: row.brand_website.clone(),
            domain_verified: false,
            sentiment: None,
            ranking_position: None,
        };

        let resolved = store
            .resolve_canonical_brands(std::slice::from_ref(&mention), threshold)
            .await
            .and_then(|ids| PipelineError::check_cardinality("canonical resolution", 1, ids));
        let canonical_id = match resolved {
            Ok(ids) => ids.into_iter().next().flatten(),
            Err(e) => {
                tracing::warn!(
                    result_id = %row.result_id,
                    slug = %row.brand_slug,
                    error = %e,
                    "repair resolution failed"
                );
                None
            }
        };
        let Some(canonical_id) = canonical_id else {
            summary.unresolved += 1;
            continue;
        };

        let is_own_brand = match tracked.find(row.website_id) {
            Some(website) => match_own_brand(store, website, &[mention.name.as_str()], threshold)
                .await
                .first()
                .copied()
                .unwrap_or(false),
            None => {
                tracing::warn!(
                    website_id = %row.website_id,
                    "website is not tracked; leaving own-brand flag unchanged"
                );
                false
            }
        };

        let updated = store
            .repair_fact_identity(row.result_id, &row.brand_slug, canonical_id, is_own_brand)
            .await?;
        tracing::debug!(
            result_id = %row.result_id,
            slug = %row.brand_slug,
            canonical_brand_id = %canonical_id,
            updated,
            "repaired fact identity"
        );
        summary.repaired += 1;
        summary.rows_updated += updated;
    }

    tracing::info!(
        examined = summary.examined,
        repaired = summary.repaired,
        rows_updated = summary.rows_updated,
        unresolved = summary.unresolved,
        "repair pass complete"
    );
    Ok(summary)
}
