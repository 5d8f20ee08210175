//! Per-answer orchestration: validate, resolve, match, expand, write.

use aivis_core::{
    classify_citations, expand_answer_facts, match_own_brand_batch, AnswerContext, FactRow,
    Mention, ResolvedMention, TrackedWebsite,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::own_brand::try_match_own_brand;
use crate::store::AnswerStore;

/// What processing one answer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub facts_written: usize,
    /// Valid mentions that went through resolution.
    pub mentions: usize,
    /// Mentions rejected before resolution (blank or punctuation-only names).
    pub skipped_mentions: usize,
    /// A batched resolution or own-brand call failed or answered the wrong
    /// number of mentions; every mention was written without identity and as
    /// a competitor.
    pub degraded: bool,
}

struct ValidMention<'a> {
    mention: &'a Mention,
    slug: String,
}

fn validate_mentions(answer: &AnswerContext) -> (Vec<ValidMention<'_>>, usize) {
    let mut valid = Vec::with_capacity(answer.mentions.len());
    let mut skipped = 0;
    for mention in &answer.mentions {
        match mention.identity_slug() {
            Ok(slug) => valid.push(ValidMention { mention, slug }),
            Err(e) => {
                tracing::warn!(
                    result_id = %answer.result_id,
                    name = %mention.name,
                    error = %e,
                    "skipping invalid mention"
                );
                skipped += 1;
            }
        }
    }
    (valid, skipped)
}

fn zip_resolved(
    valid: &[ValidMention<'_>],
    ids: &[Option<Uuid>],
    own_flags: &[bool],
) -> Vec<ResolvedMention> {
    valid
        .iter()
        .zip(ids)
        .zip(own_flags)
        .map(|((v, id), own)| ResolvedMention {
            mention: v.mention.clone(),
            slug: v.slug.clone(),
            canonical_brand_id: *id,
            is_own_brand: *own,
        })
        .collect()
}

/// One batched resolution call and one batched own-brand call for the valid
/// mentions, both checked against the input length.
async fn enrich_batch<S>(
    store: &S,
    tracked: &TrackedWebsite,
    valid: &[ValidMention<'_>],
    threshold: f64,
) -> Result<(Vec<Option<Uuid>>, Vec<bool>), PipelineError>
where
    S: AnswerStore + ?Sized,
{
    let mentions: Vec<Mention> = valid.iter().map(|v| v.mention.clone()).collect();
    let ids = store.resolve_canonical_brands(&mentions, threshold).await?;
    let ids = PipelineError::check_cardinality("canonical resolution", mentions.len(), ids)?;

    let names: Vec<&str> = valid.iter().map(|v| v.mention.name.as_str()).collect();
    let own_flags = try_match_own_brand(store, tracked, &names, threshold).await?;

    Ok((ids, own_flags))
}

/// Process one analyzed answer end to end.
///
/// All valid mentions go to the store in one batched resolution call and one
/// batched own-brand call. If either batch fails or answers the wrong number
/// of mentions, the whole batch is degraded: every mention is written with a
/// null canonical identity and as a competitor. Either way the answer's facts
/// are written.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if the fact write fails, so the job can
/// be retried. Identity and own-brand failures never error.
pub async fn process_answer<S>(
    store: &S,
    tracked: &TrackedWebsite,
    answer: &AnswerContext,
    threshold: f64,
) -> Result<AnswerOutcome, PipelineError>
where
    S: AnswerStore + ?Sized,
{
    let (valid, skipped_mentions) = validate_mentions(answer);

    let (ids, own_flags, degraded) = if valid.is_empty() {
        (Vec::new(), Vec::new(), false)
    } else {
        match enrich_batch(store, tracked, &valid, threshold).await {
            Ok((ids, own_flags)) => (ids, own_flags, false),
            Err(e) => {
                tracing::warn!(
                    result_id = %answer.result_id,
                    error = %e,
                    "mention batch degraded; writing mentions without identity as competitors"
                );
                (vec![None; valid.len()], vec![false; valid.len()], true)
            }
        }
    };

    let resolved = zip_resolved(&valid, &ids, &own_flags);
    let tracked_domain = tracked.normalized_domain();
    let facts = expand_answer_facts(answer, tracked_domain.as_deref(), &resolved);
    let citations = classify_citations(&answer.citations, tracked_domain.as_deref());

    let facts_written = store
        .write_answer_facts(answer.result_id, &facts, &citations)
        .await?;

    tracing::info!(
        result_id = %answer.result_id,
        website_id = %answer.website_id,
        facts_written,
        mentions = resolved.len(),
        skipped_mentions,
        degraded,
        "answer processed"
    );

    Ok(AnswerOutcome {
        facts_written,
        mentions: resolved.len(),
        skipped_mentions,
        degraded,
    })
}

/// The fact rows an answer would produce, without touching any store.
///
/// Canonical identities are left null and own-brand matching uses only the
/// configured aliases.
#[must_use]
pub fn preview_answer_facts(
    tracked: &TrackedWebsite,
    answer: &AnswerContext,
    threshold: f64,
) -> Vec<FactRow> {
    let (valid, _) = validate_mentions(answer);
    let names: Vec<&str> = valid.iter().map(|v| v.mention.name.as_str()).collect();
    let own_flags = match_own_brand_batch(&tracked.brand(), &names, threshold);
    let ids = vec![None; valid.len()];
    let resolved = zip_resolved(&valid, &ids, &own_flags);
    expand_answer_facts(answer, tracked.normalized_domain().as_deref(), &resolved)
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
