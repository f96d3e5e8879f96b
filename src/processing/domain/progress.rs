//! Mutable progress counters for a processing task.

use super::SourceId;
use serde::{Deserialize, Serialize};

/// A source that was skipped during processing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    /// Skipped source identifier.
    pub source_id: SourceId,
    /// Human-readable reason the source was skipped.
    pub reason: String,
}

/// Progress snapshot persisted with each task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    current: u32,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    processed_sources: Vec<SourceId>,
    #[serde(default)]
    skipped_sources: Vec<SkippedSource>,
}

/// A single progress change reported by a sub-job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// The source finished processing.
    SourceProcessed(SourceId),
    /// The source was skipped.
    SourceSkipped {
        /// Skipped source identifier.
        source_id: SourceId,
        /// Reason the source was skipped.
        reason: String,
    },
}

impl TaskProgress {
    /// Creates zeroed progress sized for `total` sources.
    #[must_use]
    pub const fn new(total: u32) -> Self {
        Self {
            current: 0,
            total,
            processed_sources: Vec::new(),
            skipped_sources: Vec::new(),
        }
    }

    /// Returns the number of sources handled so far.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Returns the number of sources the task was sized for.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Returns sources processed so far.
    #[must_use]
    pub fn processed_sources(&self) -> &[SourceId] {
        &self.processed_sources
    }

    /// Returns sources skipped so far.
    #[must_use]
    pub fn skipped_sources(&self) -> &[SkippedSource] {
        &self.skipped_sources
    }

    /// Returns whether the source has already been processed or skipped.
    #[must_use]
    pub fn has_seen(&self, source_id: SourceId) -> bool {
        self.processed_sources.contains(&source_id)
            || self
                .skipped_sources
                .iter()
                .any(|skipped| skipped.source_id == source_id)
    }

    /// Applies an update. Returns `false` when the source was already
    /// recorded and nothing changed.
    pub fn apply(&mut self, update: ProgressUpdate) -> bool {
        match update {
            ProgressUpdate::SourceProcessed(source_id) => {
                if self.has_seen(source_id) {
                    return false;
                }
                self.processed_sources.push(source_id);
            }
            ProgressUpdate::SourceSkipped { source_id, reason } => {
                if self.has_seen(source_id) {
                    return false;
                }
                self.skipped_sources.push(SkippedSource { source_id, reason });
            }
        }
        self.current = self.current.saturating_add(1);
        true
    }
}
