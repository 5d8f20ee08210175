//! Answer processing command handlers for the CLI.
//!
//! Answers are read from JSON files and processed with bounded concurrency.
//! A failed answer is logged and counted rather than aborting the run; the
//! command exits non-zero at the end so the batch can be redelivered.

use std::path::{Path, PathBuf};

use aivis_core::{AnswerContext, AppConfig, TrackedWebsitesFile};
use aivis_pipeline::{preview_answer_facts, process_answer, PgAnswerStore};
use futures::stream::{self, StreamExt};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerFile {
    Many(Vec<AnswerContext>),
    One(Box<AnswerContext>),
}

/// Read every answer from the given files, in file order.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or parsed.
pub(crate) fn load_answers(files: &[PathBuf]) -> anyhow::Result<Vec<AnswerContext>> {
    let mut answers = Vec::new();
    for path in files {
        answers.extend(load_answer_file(path)?);
    }
    Ok(answers)
}

fn load_answer_file(path: &Path) -> anyhow::Result<Vec<AnswerContext>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let parsed: AnswerFile = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(match parsed {
        AnswerFile::Many(answers) => answers,
        AnswerFile::One(answer) => vec![*answer],
    })
}

/// Print the fact rows each answer would produce. No database access.
///
/// # Errors
///
/// Returns an error if an answer file cannot be loaded or an answer belongs
/// to a website that is not tracked.
pub(crate) fn run_process_dry_run(
    config: &AppConfig,
    tracked: &TrackedWebsitesFile,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let answers = load_answers(files)?;
    for answer in &answers {
        let website = tracked.find(answer.website_id).ok_or_else(|| {
            anyhow::anyhow!(
                "answer {} belongs to untracked website {}",
                answer.result_id,
                answer.website_id
            )
        })?;
        let facts = preview_answer_facts(website, answer, config.similarity_threshold);
        println!(
            "dry-run: answer {} would write {} fact row(s)",
            answer.result_id,
            facts.len()
        );
        println!("{}", serde_json::to_string_pretty(&facts)?);
    }
    Ok(())
}

/// Process every answer in `files` against the database.
///
/// # Errors
///
/// Returns an error if an answer file cannot be loaded, or after the run if
/// any answer failed.
pub(crate) async fn run_process(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    tracked: &TrackedWebsitesFile,
    files: &[PathBuf],
    concurrency: usize,
) -> anyhow::Result<()> {
    let answers = load_answers(files)?;
    let total = answers.len();
    let store = PgAnswerStore::new(pool.clone());
    let threshold = config.similarity_threshold;

    tracing::info!(answers = total, concurrency, "processing answers");

    let results: Vec<bool> = stream::iter(answers.iter())
        .map(|answer| {
            let store = &store;
            async move {
                let Some(website) = tracked.find(answer.website_id) else {
                    tracing::error!(
                        result_id = %answer.result_id,
                        website_id = %answer.website_id,
                        "answer belongs to an untracked website"
                    );
                    return false;
                };
                match process_answer(store, website, answer, threshold).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::error!(
                            result_id = %answer.result_id,
                            error = %e,
                            "answer processing failed"
                        );
                        false
                    }
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let failed = results.iter().filter(|ok| !**ok).count();
    println!("processed {} of {total} answer(s)", total - failed);
    if failed > 0 {
        anyhow::bail!("{failed} answer(s) failed; rerun to retry them");
    }
    Ok(())
}
