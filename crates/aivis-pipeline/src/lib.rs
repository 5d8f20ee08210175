//! Answer processing for AI answer brand analytics.
//!
//! Takes one analyzed answer, resolves every mention to a canonical brand in
//! a single batched call, flags own-brand mentions in a single batched call,
//! and writes the expanded fact rows. Identity failures degrade the answer's
//! rows to null identity and non-own-brand instead of losing the answer;
//! store failures on the fact write surface so the job can be retried.

pub mod error;
pub mod orchestrator;
pub mod own_brand;
pub mod repair;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::PipelineError;
pub use orchestrator::{preview_answer_facts, process_answer, AnswerOutcome};
pub use own_brand::match_own_brand;
pub use repair::{repair_unresolved, RepairSummary};
pub use store::{AnswerStore, PgAnswerStore};
