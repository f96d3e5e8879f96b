//! Task kind and creation-time parameters.

use super::{ParseTaskKindError, ParseTimeRangeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated type of orchestration task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Fetch and process every active source of the owner, then build a digest.
    ProcessAllSources,
}

impl TaskKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProcessAllSources => "process_all_sources",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "process_all_sources" => Ok(Self::ProcessAllSources),
            _ => Err(ParseTaskKindError(value.to_owned())),
        }
    }
}

/// Period of content a digest should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// The last day.
    Day,
    /// The last week.
    #[default]
    Week,
    /// The last month.
    Month,
}

impl TimeRange {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TimeRange {
    type Error = ParseTimeRangeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ParseTimeRangeError(value.to_owned())),
        }
    }
}

/// Immutable parameters captured when a task is admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Time range the resulting digest should cover.
    #[serde(default)]
    pub time_range: TimeRange,
}

impl TaskConfig {
    /// Creates a configuration for the given time range.
    #[must_use]
    pub const fn new(time_range: TimeRange) -> Self {
        Self { time_range }
    }
}
