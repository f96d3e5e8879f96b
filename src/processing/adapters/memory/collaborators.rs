//! In-memory stand-ins for the external collaborators.
//!
//! These adapters model the fetch/processing aggregation view, the source
//! registry, user settings and the digest generator without any I/O. They are
//! suitable for unit and integration tests and for local deterministic
//! orchestration flows.

use crate::processing::{
    domain::{CompletionCounts, OwnerId, TaskId},
    ports::{
        ActiveSourceCounter, CompletionCountsSource, CompletionQueryError, CompletionQueryResult,
        DigestAck, DigestGenerationError, DigestGenerator, DigestRequest, PreferenceLookupError,
        SourceCountError, UserPreferences,
    },
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

fn lock_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// In-memory sub-job aggregation view.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompletionCounts {
    state: Arc<RwLock<CompletionCountsState>>,
}

#[derive(Debug, Default)]
struct CompletionCountsState {
    counts: HashMap<TaskId, CompletionCounts>,
    failing: HashMap<TaskId, String>,
}

impl InMemoryCompletionCounts {
    /// Creates an empty aggregation view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the counts reported for a task.
    ///
    /// # Errors
    ///
    /// Returns a query error when lock acquisition fails.
    pub fn set_counts(
        &self,
        task_id: TaskId,
        counts: CompletionCounts,
    ) -> CompletionQueryResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| CompletionQueryError::query(lock_error(err)))?;
        state.counts.insert(task_id, counts);
        Ok(())
    }

    /// Makes queries for a task fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns a query error when lock acquisition fails.
    pub fn fail_for(
        &self,
        task_id: TaskId,
        message: impl Into<String>,
    ) -> CompletionQueryResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| CompletionQueryError::query(lock_error(err)))?;
        state.failing.insert(task_id, message.into());
        Ok(())
    }
}

#[async_trait]
impl CompletionCountsSource for InMemoryCompletionCounts {
    async fn completion_counts(
        &self,
        task_id: TaskId,
    ) -> CompletionQueryResult<Option<CompletionCounts>> {
        let state = self
            .state
            .read()
            .map_err(|err| CompletionQueryError::query(lock_error(err)))?;
        if let Some(message) = state.failing.get(&task_id) {
            return Err(CompletionQueryError::query(std::io::Error::other(
                message.clone(),
            )));
        }
        Ok(state.counts.get(&task_id).copied())
    }
}

/// In-memory source registry reporting active source counts per owner.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceRegistry {
    counts: Arc<RwLock<HashMap<OwnerId, u32>>>,
}

impl InMemorySourceRegistry {
    /// Creates a registry where every owner has zero sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active source count for an owner.
    ///
    /// # Errors
    ///
    /// Returns a lookup error when lock acquisition fails.
    pub fn set_active_sources(&self, owner: OwnerId, count: u32) -> Result<(), SourceCountError> {
        let mut counts = self
            .counts
            .write()
            .map_err(|err| SourceCountError::lookup(lock_error(err)))?;
        counts.insert(owner, count);
        Ok(())
    }
}

#[async_trait]
impl ActiveSourceCounter for InMemorySourceRegistry {
    async fn count_active_sources(&self, owner: OwnerId) -> Result<u32, SourceCountError> {
        let counts = self
            .counts
            .read()
            .map_err(|err| SourceCountError::lookup(lock_error(err)))?;
        Ok(counts.get(&owner).copied().unwrap_or_default())
    }
}

/// In-memory user settings store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserPreferences {
    state: Arc<RwLock<PreferencesState>>,
}

#[derive(Debug, Default)]
struct PreferencesState {
    timezones: HashMap<OwnerId, String>,
    failing: HashSet<OwnerId>,
}

impl InMemoryUserPreferences {
    /// Creates a store with no preferences.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an owner's digest timezone.
    ///
    /// # Errors
    ///
    /// Returns a lookup error when lock acquisition fails.
    pub fn set_timezone(
        &self,
        owner: OwnerId,
        timezone: impl Into<String>,
    ) -> Result<(), PreferenceLookupError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PreferenceLookupError::lookup(lock_error(err)))?;
        state.timezones.insert(owner, timezone.into());
        Ok(())
    }

    /// Makes lookups for an owner fail.
    ///
    /// # Errors
    ///
    /// Returns a lookup error when lock acquisition fails.
    pub fn fail_for(&self, owner: OwnerId) -> Result<(), PreferenceLookupError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PreferenceLookupError::lookup(lock_error(err)))?;
        state.failing.insert(owner);
        Ok(())
    }
}

#[async_trait]
impl UserPreferences for InMemoryUserPreferences {
    async fn timezone(&self, owner: OwnerId) -> Result<Option<String>, PreferenceLookupError> {
        let state = self
            .state
            .read()
            .map_err(|err| PreferenceLookupError::lookup(lock_error(err)))?;
        if state.failing.contains(&owner) {
            return Err(PreferenceLookupError::lookup(std::io::Error::other(
                "user settings unavailable",
            )));
        }
        Ok(state.timezones.get(&owner).cloned())
    }
}

/// Digest generator that records every request it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingDigestGenerator {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    requests: Vec<DigestRequest>,
    failure: Option<DigestGenerationError>,
}

impl RecordingDigestGenerator {
    /// Creates a generator that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent requests fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns a generation error when lock acquisition fails.
    pub fn fail_with(&self, error: DigestGenerationError) -> Result<(), DigestGenerationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| DigestGenerationError::new(err.to_string()))?;
        state.failure = Some(error);
        Ok(())
    }

    /// Returns the requests received so far.
    ///
    /// # Errors
    ///
    /// Returns a generation error when lock acquisition fails.
    pub fn requests(&self) -> Result<Vec<DigestRequest>, DigestGenerationError> {
        let state = self
            .state
            .lock()
            .map_err(|err| DigestGenerationError::new(err.to_string()))?;
        Ok(state.requests.clone())
    }
}

#[async_trait]
impl DigestGenerator for RecordingDigestGenerator {
    async fn generate_digest(
        &self,
        request: &DigestRequest,
    ) -> Result<DigestAck, DigestGenerationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| DigestGenerationError::new(err.to_string()))?;
        state.requests.push(request.clone());
        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }
        Ok(DigestAck {
            reference: Some(format!("digest-request-{}", state.requests.len())),
        })
    }
}
