//! Port for the source-management subsystem.

use crate::processing::domain::OwnerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Counts an owner's active content sources.
#[async_trait]
pub trait ActiveSourceCounter: Send + Sync {
    /// Returns the number of active sources registered by `owner`.
    async fn count_active_sources(&self, owner: OwnerId) -> Result<u32, SourceCountError>;
}

/// Errors returned by source counting adapters.
#[derive(Debug, Clone, Error)]
pub enum SourceCountError {
    /// The lookup failed.
    #[error("failed to count active sources: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl SourceCountError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
