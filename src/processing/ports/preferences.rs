//! Port for the user-settings subsystem.

use crate::processing::domain::OwnerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Read-only lookup of owner preferences needed for digest generation.
#[async_trait]
pub trait UserPreferences: Send + Sync {
    /// Returns the owner's configured digest timezone, if one is set.
    async fn timezone(&self, owner: OwnerId) -> Result<Option<String>, PreferenceLookupError>;
}

/// Errors returned by preference lookup adapters.
#[derive(Debug, Clone, Error)]
pub enum PreferenceLookupError {
    /// The lookup failed.
    #[error("preference lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl PreferenceLookupError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
