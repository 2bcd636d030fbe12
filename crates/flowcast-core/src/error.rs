//! Core error types for flowcast-core.
//!
//! Small leaf enums per concern, `#[from]`-folded into one top-level
//! `CoreError` so callers at the API boundary only ever match on a
//! single type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::UserId;

/// Top-level error type returned by every `FlowCastCore` entry point.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed input: bad hour, missing tag, duration out of range.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The Decision Engine could not place the task anywhere in the
    /// look-ahead horizon.
    #[error("scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Repository read/write failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Referenced task, schedule item, or user does not exist (or is not
    /// owned by the caller).
    #[error("not found: {kind} '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// Deadline already past, or shorter than the task's own duration.
    #[error("deadline infeasible: {reason}")]
    DeadlineInfeasible { reason: String },
}

/// Validation-specific errors (surfaced as 400 at a transport boundary;
/// never reach persistence).
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("duration {minutes} minutes out of range (1..=720)")]
    DurationOutOfRange { minutes: i64 },

    #[error("priority {priority} out of range (1..=5)")]
    PriorityOutOfRange { priority: i32 },

    #[error("hour {hour} out of range (0..=23)")]
    HourOutOfRange { hour: u32 },

    #[error("energy level {level} out of range [0.0, 1.0]")]
    EnergyOutOfRange { level: f64 },

    #[error("invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Errors raised while running the Decision Engine or Cascade.
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// Decision Engine exhausted the 6-day look-ahead without a slot.
    #[error("no optimal time found for task '{task_id}' within the look-ahead horizon")]
    NoOptimalTime { task_id: String },

    /// The incoming placement collided with an immovable item (a manual
    /// task or a calendar event) and could not displace it.
    #[error("conflict with immovable item '{item_id}' for task '{task_id}'")]
    ConflictWithImmovable { task_id: String, item_id: String },
}

/// Errors surfaced by a `TaskRepository`/`ScheduleRepository`/
/// `EnergyRepository`/`UserRepository` implementation.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("transient persistence failure: {0}")]
    Transient(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unknown user: {0:?}")]
    UnknownUser(UserId),
}

/// Result type alias for CoreError.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
