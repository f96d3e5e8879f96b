//! Command-line entrypoint for processing task orchestration.
//!
//! Usage:
//!
//! ```text
//! curator poll
//! curator start <owner-uuid> [day|week|month]
//! ```
//!
//! `poll` runs one completion poll cycle. An external scheduler invokes it
//! periodically; it queues a digest request for each running task whose
//! fetch and processing sub-jobs have all finished. `start` admits a new
//! processing task for the owner, reclaiming a stale one first.
//!
//! Both commands read `DATABASE_URL`, `CURATOR_STALENESS_THRESHOLD` and
//! `CURATOR_DEFAULT_TIMEZONE`. The exit status is `0` on success, `1` when
//! the command could not run, `2` when a poll cycle recorded failures and
//! `3` when admission was refused because a task is already active.

use curator::config::{ConfigError, OrchestrationConfig};
use curator::processing::adapters::postgres::{
    PostgresActiveSourceCounter, PostgresCompletionCounts, PostgresDigestOutbox,
    PostgresProcessingTaskRepository, PostgresUserPreferences, ProcessingPgPool,
};
use curator::processing::domain::{OwnerId, ParseTimeRangeError, TimeRange};
use curator::processing::services::{
    AdmissionError, CompletionOracle, CompletionPoller, DigestTriggerAdapter, PollReport,
    StartTaskRequest, TaskAdmissionService,
};
use curator::telemetry::init_tracing;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info, warn};

const POLL_FAILURES_EXIT: u8 = 2;
const CONFLICT_EXIT: u8 = 3;

#[derive(Debug, Error)]
enum CommandError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("invalid owner id: {0}")]
    InvalidOwner(#[from] uuid::Error),
    #[error(transparent)]
    InvalidTimeRange(#[from] ParseTimeRangeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
    #[error("connection pool setup was interrupted: {0}")]
    Setup(#[from] JoinError),
    #[error(transparent)]
    Admission(#[from] AdmissionError),
}

#[derive(Debug)]
enum Command {
    Poll,
    Start { owner: OwnerId, time_range: TimeRange },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, CommandError> {
        match args {
            [command] if command == "poll" => Ok(Self::Poll),
            [command, owner] if command == "start" => Ok(Self::Start {
                owner: OwnerId::from_uuid(uuid::Uuid::parse_str(owner)?),
                time_range: TimeRange::default(),
            }),
            [command, owner, range] if command == "start" => Ok(Self::Start {
                owner: OwnerId::from_uuid(uuid::Uuid::parse_str(owner)?),
                time_range: TimeRange::try_from(range.as_str())?,
            }),
            _ => Err(CommandError::InvalidArgs(
                "expected `poll` or `start <owner-uuid> [day|week|month]`".to_owned(),
            )),
        }
    }
}

enum Outcome {
    Polled(PollReport),
    Started,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(Outcome::Started) => ExitCode::SUCCESS,
        Ok(Outcome::Polled(report)) if report.errors.is_empty() => ExitCode::SUCCESS,
        Ok(Outcome::Polled(report)) => {
            for failure in &report.errors {
                warn!(
                    task_id = ?failure.task_id,
                    kind = %failure.kind,
                    message = %failure.message,
                    "poll failure"
                );
            }
            ExitCode::from(POLL_FAILURES_EXIT)
        }
        Err(CommandError::Admission(AdmissionError::Conflict { task_id, status })) => {
            warn!(%task_id, %status, "processing already in progress");
            ExitCode::from(CONFLICT_EXIT)
        }
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<Outcome, CommandError> {
    let command = Command::parse(args)?;
    let config = OrchestrationConfig::from_env()?;
    let pool = connect(config.require_database_url()?).await?;
    let clock = Arc::new(DefaultClock);
    let repository = Arc::new(PostgresProcessingTaskRepository::new(pool.clone()));

    match command {
        Command::Poll => {
            let oracle =
                CompletionOracle::new(Arc::new(PostgresCompletionCounts::new(pool.clone())));
            let trigger = DigestTriggerAdapter::new(
                Arc::clone(&repository),
                Arc::new(PostgresUserPreferences::new(pool.clone())),
                Arc::new(PostgresDigestOutbox::new(pool, Arc::clone(&clock))),
                Arc::clone(&clock),
            )
            .with_default_timezone(config.default_timezone);
            let poller = CompletionPoller::new(repository, oracle, trigger, clock);
            Ok(Outcome::Polled(poller.poll_once().await))
        }
        Command::Start { owner, time_range } => {
            let admission = TaskAdmissionService::new(
                repository,
                Arc::new(PostgresActiveSourceCounter::new(pool)),
                clock,
            )
            .with_staleness_threshold(config.staleness_threshold);
            let task = admission
                .start(StartTaskRequest::new(owner).with_time_range(time_range))
                .await?;
            info!(task_id = %task.id(), %owner, "processing task started");
            Ok(Outcome::Started)
        }
    }
}

async fn connect(database_url: &str) -> Result<ProcessingPgPool, CommandError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = tokio::task::spawn_blocking(move || Pool::builder().build(manager)).await??;
    Ok(pool)
}
