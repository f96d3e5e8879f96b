//! Port for the sub-job aggregation query owned by the fetch and processing
//! subsystems.

use crate::processing::domain::{CompletionCounts, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for aggregation queries.
pub type CompletionQueryResult<T> = Result<T, CompletionQueryError>;

/// Source of per-phase sub-job counts.
#[async_trait]
pub trait CompletionCountsSource: Send + Sync {
    /// Returns aggregate fetch and processing counts for a task.
    ///
    /// Returns `None` when the aggregation view has no rows for the task.
    async fn completion_counts(
        &self,
        task_id: TaskId,
    ) -> CompletionQueryResult<Option<CompletionCounts>>;
}

/// Errors returned by aggregation query adapters.
#[derive(Debug, Clone, Error)]
pub enum CompletionQueryError {
    /// The aggregation query failed.
    #[error("completion count query failed: {0}")]
    Query(Arc<dyn std::error::Error + Send + Sync>),
}

impl CompletionQueryError {
    /// Wraps a query failure.
    pub fn query(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Query(Arc::new(err))
    }
}
