//! Diesel row models for processing task persistence.

use super::schema::{digest_requests, processing_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for processing task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = processing_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProcessingTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Task kind.
    pub task_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Creation parameters.
    pub config: Value,
    /// Progress counters.
    pub progress: Value,
    /// Terminal payload.
    pub result: Option<Value>,
    /// Digest trigger claim timestamp.
    pub digest_requested_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for processing task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = processing_tasks)]
pub struct NewProcessingTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Task kind.
    pub task_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Creation parameters.
    pub config: Value,
    /// Progress counters.
    pub progress: Value,
    /// Terminal payload.
    pub result: Option<Value>,
    /// Digest trigger claim timestamp.
    pub digest_requested_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Changeset written by status transitions. Progress is excluded.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = processing_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskStatusChangeset {
    /// New lifecycle status.
    pub status: String,
    /// New terminal payload.
    pub result: Option<Value>,
    /// Digest trigger claim timestamp.
    pub digest_requested_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Row returned by the `get_task_completion_status` aggregation function.
#[derive(Debug, Clone, QueryableByName)]
pub struct CompletionCountsRow {
    /// Fetch jobs scheduled.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub fetch_jobs_total: i64,
    /// Fetch jobs finished successfully.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub fetch_jobs_completed: i64,
    /// Fetch jobs finished with a failure.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub fetch_jobs_failed: i64,
    /// Content items created.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub content_items_total: i64,
    /// Content items processed successfully.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub content_items_processed: i64,
    /// Content items whose processing failed.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub content_items_failed: i64,
}

/// Insert model for the digest request outbox.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = digest_requests)]
pub struct NewDigestRequestRow {
    /// Request identifier.
    pub id: uuid::Uuid,
    /// Task whose content feeds the digest.
    pub task_id: uuid::Uuid,
    /// Owning user.
    pub user_id: uuid::Uuid,
    /// Requested time range.
    pub time_range: String,
    /// Whether the digest is built from partial results.
    pub partial: bool,
    /// Rendering timezone.
    pub timezone: String,
    /// When the request was queued.
    pub requested_at: DateTime<Utc>,
}
