//! `PostgreSQL` adapters for the collaborators the orchestration core reads
//! from and the digest request outbox it writes to.

use super::{
    blocking::{BlockingError, ProcessingPgPool, run_blocking},
    models::{CompletionCountsRow, NewDigestRequestRow},
    schema::{content_sources, digest_requests, user_settings},
};
use crate::processing::{
    domain::{CompletionCounts, OwnerId, PhaseCounts, TaskId},
    ports::{
        ActiveSourceCounter, CompletionCountsSource, CompletionQueryError, CompletionQueryResult,
        DigestAck, DigestGenerationError, DigestGenerator, DigestRequest, PreferenceLookupError,
        SourceCountError, UserPreferences,
    },
};
use async_trait::async_trait;
use diesel::prelude::*;
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;

const COMPLETION_STATUS_QUERY: &str = concat!(
    "SELECT fetch_jobs_total, fetch_jobs_completed, fetch_jobs_failed, ",
    "content_items_total, content_items_processed, content_items_failed ",
    "FROM get_task_completion_status($1)",
);

/// Reads sub-job counts through the `get_task_completion_status` function.
#[derive(Debug, Clone)]
pub struct PostgresCompletionCounts {
    pool: ProcessingPgPool,
}

impl PostgresCompletionCounts {
    /// Creates the adapter from a connection pool.
    #[must_use]
    pub const fn new(pool: ProcessingPgPool) -> Self {
        Self { pool }
    }
}

fn completion_blocking_error(err: BlockingError) -> CompletionQueryError {
    CompletionQueryError::query(err)
}

#[async_trait]
impl CompletionCountsSource for PostgresCompletionCounts {
    async fn completion_counts(
        &self,
        task_id: TaskId,
    ) -> CompletionQueryResult<Option<CompletionCounts>> {
        run_blocking(&self.pool, completion_blocking_error, move |connection| {
            let rows = diesel::sql_query(COMPLETION_STATUS_QUERY)
                .bind::<diesel::sql_types::Uuid, _>(task_id.into_inner())
                .load::<CompletionCountsRow>(connection)
                .map_err(CompletionQueryError::query)?;
            rows.into_iter().next().map(counts_from_row).transpose()
        })
        .await
    }
}

pub(super) fn counts_from_row(row: CompletionCountsRow) -> CompletionQueryResult<CompletionCounts> {
    Ok(CompletionCounts::new(
        phase(
            row.fetch_jobs_total,
            row.fetch_jobs_completed,
            row.fetch_jobs_failed,
        )?,
        phase(
            row.content_items_total,
            row.content_items_processed,
            row.content_items_failed,
        )?,
    ))
}

fn phase(total: i64, completed: i64, failed: i64) -> CompletionQueryResult<PhaseCounts> {
    let convert = |value: i64| u64::try_from(value).map_err(CompletionQueryError::query);
    Ok(PhaseCounts::new(
        convert(total)?,
        convert(completed)?,
        convert(failed)?,
    ))
}

/// Counts active content sources per owner.
#[derive(Debug, Clone)]
pub struct PostgresActiveSourceCounter {
    pool: ProcessingPgPool,
}

impl PostgresActiveSourceCounter {
    /// Creates the adapter from a connection pool.
    #[must_use]
    pub const fn new(pool: ProcessingPgPool) -> Self {
        Self { pool }
    }
}

fn source_blocking_error(err: BlockingError) -> SourceCountError {
    SourceCountError::lookup(err)
}

#[async_trait]
impl ActiveSourceCounter for PostgresActiveSourceCounter {
    async fn count_active_sources(&self, owner: OwnerId) -> Result<u32, SourceCountError> {
        run_blocking(&self.pool, source_blocking_error, move |connection| {
            let count = content_sources::table
                .filter(content_sources::user_id.eq(owner.into_inner()))
                .filter(content_sources::is_active.eq(true))
                .count()
                .get_result::<i64>(connection)
                .map_err(SourceCountError::lookup)?;
            u32::try_from(count).map_err(SourceCountError::lookup)
        })
        .await
    }
}

/// Reads digest timezones from user settings.
#[derive(Debug, Clone)]
pub struct PostgresUserPreferences {
    pool: ProcessingPgPool,
}

impl PostgresUserPreferences {
    /// Creates the adapter from a connection pool.
    #[must_use]
    pub const fn new(pool: ProcessingPgPool) -> Self {
        Self { pool }
    }
}

fn preference_blocking_error(err: BlockingError) -> PreferenceLookupError {
    PreferenceLookupError::lookup(err)
}

#[async_trait]
impl UserPreferences for PostgresUserPreferences {
    async fn timezone(&self, owner: OwnerId) -> Result<Option<String>, PreferenceLookupError> {
        run_blocking(&self.pool, preference_blocking_error, move |connection| {
            let timezone = user_settings::table
                .filter(user_settings::user_id.eq(owner.into_inner()))
                .select(user_settings::auto_digest_timezone)
                .first::<Option<String>>(connection)
                .optional()
                .map_err(PreferenceLookupError::lookup)?;
            Ok(timezone.flatten())
        })
        .await
    }
}

/// Digest generator that queues requests in the `digest_requests` outbox.
///
/// The outbox holds at most one request per task; a repeated request for
/// the same task is acknowledged without a reference.
#[derive(Debug, Clone)]
pub struct PostgresDigestOutbox<C>
where
    C: Clock + Send + Sync,
{
    pool: ProcessingPgPool,
    clock: Arc<C>,
}

impl<C> PostgresDigestOutbox<C>
where
    C: Clock + Send + Sync,
{
    /// Creates the outbox from a connection pool and clock.
    #[must_use]
    pub const fn new(pool: ProcessingPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }
}

fn outbox_blocking_error(err: BlockingError) -> DigestGenerationError {
    DigestGenerationError::new(err.to_string()).with_context(json!({ "stage": "connection" }))
}

#[async_trait]
impl<C> DigestGenerator for PostgresDigestOutbox<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn generate_digest(
        &self,
        request: &DigestRequest,
    ) -> Result<DigestAck, DigestGenerationError> {
        let row = NewDigestRequestRow {
            id: uuid::Uuid::new_v4(),
            task_id: request.task_id.into_inner(),
            user_id: request.owner.into_inner(),
            time_range: request.time_range.as_str().to_owned(),
            partial: request.partial,
            timezone: request.timezone.clone(),
            requested_at: self.clock.utc(),
        };
        let reference = row.id.to_string();

        run_blocking(&self.pool, outbox_blocking_error, move |connection| {
            let inserted = diesel::insert_into(digest_requests::table)
                .values(&row)
                .on_conflict(digest_requests::task_id)
                .do_nothing()
                .execute(connection)
                .map_err(|err| {
                    DigestGenerationError::new(err.to_string())
                        .with_context(json!({ "stage": "outbox_insert" }))
                })?;
            Ok(DigestAck {
                reference: (inserted > 0).then_some(reference),
            })
        })
        .await
    }
}
