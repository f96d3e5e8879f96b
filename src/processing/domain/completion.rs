//! Phase counters and the derived completion view.
//!
//! A phase is done once every sub-job has reached a terminal state, whether
//! it succeeded or failed. Failures make the result partial but never block
//! completion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate sub-job counts for one phase of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseCounts {
    /// Number of sub-jobs scheduled in this phase.
    pub total: u64,
    /// Number of sub-jobs that finished successfully.
    pub completed: u64,
    /// Number of sub-jobs that finished with a failure.
    pub failed: u64,
}

impl PhaseCounts {
    /// Creates phase counts.
    #[must_use]
    pub const fn new(total: u64, completed: u64, failed: u64) -> Self {
        Self {
            total,
            completed,
            failed,
        }
    }

    /// Number of sub-jobs in a terminal state.
    #[must_use]
    pub const fn finished(self) -> u64 {
        self.completed.saturating_add(self.failed)
    }

    /// Returns whether every sub-job has finished. Vacuously true when no
    /// sub-jobs were scheduled.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.finished() >= self.total
    }

    /// Number of sub-jobs still outstanding.
    #[must_use]
    pub const fn remaining(self) -> u64 {
        self.total.saturating_sub(self.finished())
    }

    /// Returns whether any sub-job failed.
    #[must_use]
    pub const fn has_failures(self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for PhaseCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed, {} failed",
            self.completed, self.total, self.failed
        )
    }
}

/// Raw counts returned by the sub-job aggregation query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCounts {
    /// Fetch phase counts.
    pub fetch: PhaseCounts,
    /// Content processing phase counts.
    pub processing: PhaseCounts,
}

impl CompletionCounts {
    /// Creates completion counts from both phases.
    #[must_use]
    pub const fn new(fetch: PhaseCounts, processing: PhaseCounts) -> Self {
        Self { fetch, processing }
    }
}

/// Overall task progress as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// At least one phase still has outstanding sub-jobs.
    InProgress,
    /// Both phases have finished.
    Complete,
}

impl OverallStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Derived, non-persisted completion view for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    /// Fetch phase counts.
    pub fetch: PhaseCounts,
    /// Content processing phase counts.
    pub processing: PhaseCounts,
    /// Whether every fetch job has finished.
    pub is_fetch_complete: bool,
    /// Whether every processing job has finished.
    pub is_processing_complete: bool,
    /// Combined status of both phases.
    pub overall_status: OverallStatus,
}

impl CompletionStatus {
    /// Derives the completion view from raw counts.
    #[must_use]
    pub const fn from_counts(counts: CompletionCounts) -> Self {
        let is_fetch_complete = counts.fetch.is_complete();
        let is_processing_complete = counts.processing.is_complete();
        let overall_status = if is_fetch_complete && is_processing_complete {
            OverallStatus::Complete
        } else {
            OverallStatus::InProgress
        };
        Self {
            fetch: counts.fetch,
            processing: counts.processing,
            is_fetch_complete,
            is_processing_complete,
            overall_status,
        }
    }

    /// Returns whether both phases have finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.overall_status, OverallStatus::Complete)
    }

    /// Returns whether any sub-job has been scheduled in either phase.
    #[must_use]
    pub const fn has_sub_jobs(&self) -> bool {
        self.fetch.total > 0 || self.processing.total > 0
    }

    /// Returns whether the task completed with at least one failed sub-job.
    #[must_use]
    pub const fn has_partial_failure(&self) -> bool {
        self.is_complete() && (self.fetch.has_failures() || self.processing.has_failures())
    }
}

impl From<CompletionCounts> for CompletionStatus {
    fn from(counts: CompletionCounts) -> Self {
        Self::from_counts(counts)
    }
}
