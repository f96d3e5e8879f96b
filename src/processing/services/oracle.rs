//! Completion oracle: derives a task's completion view from sub-job counts.

use crate::processing::{
    domain::{CompletionStatus, TaskId},
    ports::{CompletionCountsSource, CompletionQueryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the completion oracle.
#[derive(Debug, Clone, Error)]
pub enum CompletionOracleError {
    /// The aggregation view has no rows for the task.
    #[error("no completion data for task {0}")]
    NotFound(TaskId),
    /// The aggregation query failed.
    #[error(transparent)]
    Query(#[from] CompletionQueryError),
}

/// Computes [`CompletionStatus`] snapshots. Reads are side-effect free.
#[derive(Clone)]
pub struct CompletionOracle<Q>
where
    Q: CompletionCountsSource,
{
    counts: Arc<Q>,
}

impl<Q> CompletionOracle<Q>
where
    Q: CompletionCountsSource,
{
    /// Creates an oracle over an aggregation query.
    #[must_use]
    pub const fn new(counts: Arc<Q>) -> Self {
        Self { counts }
    }

    /// Returns a fresh completion snapshot for the task.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionOracleError::NotFound`] when the aggregation view
    /// has no rows, or [`CompletionOracleError::Query`] when the query fails.
    pub async fn status(
        &self,
        task_id: TaskId,
    ) -> Result<CompletionStatus, CompletionOracleError> {
        self.counts
            .completion_counts(task_id)
            .await?
            .map(CompletionStatus::from_counts)
            .ok_or(CompletionOracleError::NotFound(task_id))
    }
}
