//! Own-brand matching against the tracked brand and its recorded aliases.

use aivis_core::{match_own_brand_batch, normalize_brand_name, TrackedWebsite};

use crate::error::PipelineError;
use crate::store::AnswerStore;

/// Flag each name as own-brand or not, never failing.
///
/// The tracked brand's configured aliases are extended with every spelling
/// recorded on its canonical brand. Any failure along the way yields `false`
/// for every name.
pub async fn match_own_brand<S, N>(
    store: &S,
    tracked: &TrackedWebsite,
    names: &[N],
    threshold: f64,
) -> Vec<bool>
where
    S: AnswerStore + ?Sized,
    N: AsRef<str> + Sync,
{
    match try_match_own_brand(store, tracked, names, threshold).await {
        Ok(flags) => flags,
        Err(e) => {
            tracing::warn!(
                website_id = %tracked.id,
                error = %e,
                "own-brand matching failed; treating all mentions as competitors"
            );
            vec![false; names.len()]
        }
    }
}

/// Fallible form of [`match_own_brand`].
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if the alias lookup fails, or
/// [`PipelineError::BatchCardinalityMismatch`] if the matcher does not answer
/// every name.
pub(crate) async fn try_match_own_brand<S, N>(
    store: &S,
    tracked: &TrackedWebsite,
    names: &[N],
    threshold: f64,
) -> Result<Vec<bool>, PipelineError>
where
    S: AnswerStore + ?Sized,
    N: AsRef<str> + Sync,
{
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut brand = tracked.brand();
    let recorded = store
        .recorded_aliases(&normalize_brand_name(&tracked.name))
        .await?;
    for alias in recorded {
        if !brand.aliases.contains(&alias) {
            brand.aliases.push(alias);
        }
    }

    let flags = match_own_brand_batch(&brand, names, threshold);
    PipelineError::check_cardinality("own-brand matching", names.len(), flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{acme_website, MemoryStore};
    use aivis_core::{Mention, DEFAULT_SIMILARITY_THRESHOLD};

    #[tokio::test]
    async fn configured_aliases_match_without_history() {
        let store = MemoryStore::default();
        let flags = match_own_brand(
            &store,
            &acme_website(),
            &["Acme Inc.", "Acme Corp", "Zenith"],
            DEFAULT_SIMILARITY_THRESHOLD,
        )
        .await;
        assert_eq!(flags, vec![true, true, false]);
    }

    #[tokio::test]
    async fn recorded_aliases_extend_the_tracked_brand() {
        let store = MemoryStore::default();
        let acme = Mention {
            name: "Acme".to_string(),
            domain: Some("acme.com".to_string()),
            domain_verified: true,
            sentiment: None,
            ranking_position: None,
        };
        let roadrunner = Mention {
            name: "Roadrunner Supply".to_string(),
            ..acme.clone()
        };
        store
            .resolve_canonical_brands(&[acme, roadrunner], DEFAULT_SIMILARITY_THRESHOLD)
            .await
            .unwrap();
        assert!(store.brand("acme").unwrap().domain_verified);

        let flags = match_own_brand(
            &store,
            &acme_website(),
            &["Roadrunner Supply"],
            DEFAULT_SIMILARITY_THRESHOLD,
        )
        .await;
        assert_eq!(flags, vec![true]);
    }

    #[tokio::test]
    async fn alias_lookup_failure_fails_safe_to_false() {
        let store = MemoryStore {
            fail_alias_lookup: true,
            ..MemoryStore::default()
        };
        let flags = match_own_brand(
            &store,
            &acme_website(),
            &["Acme", "ACME Inc."],
            DEFAULT_SIMILARITY_THRESHOLD,
        )
        .await;
        assert_eq!(flags, vec![false, false]);
    }

    #[tokio::test]
    async fn no_names_skip_the_store() {
        let store = MemoryStore {
            fail_alias_lookup: true,
            ..MemoryStore::default()
        };
        let names: [&str; 0] = [];
        let flags = try_match_own_brand(
            &store,
            &acme_website(),
            &names,
            DEFAULT_SIMILARITY_THRESHOLD,
        )
        .await
        .unwrap();
        assert!(flags.is_empty());
    }
}
