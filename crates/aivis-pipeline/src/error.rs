use aivis_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("{operation} returned {actual} results for {expected} inputs")]
    BatchCardinalityMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl PipelineError {
    /// Check that a batched call answered every input exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::BatchCardinalityMismatch`] when the lengths differ.
    pub fn check_cardinality<T>(
        operation: &'static str,
        expected: usize,
        results: Vec<T>,
    ) -> Result<Vec<T>, PipelineError> {
        if results.len() == expected {
            Ok(results)
        } else {
            Err(PipelineError::BatchCardinalityMismatch {
                operation,
                expected,
                actual: results.len(),
            })
        }
    }
}
