//! Core data model: `Task`, `ScheduleItem`, energy types, sleep schedule.

mod energy;
mod profile;
mod schedule_item;
mod task;

pub use energy::{EnergySample, EnergyStage, HistoricalEnergyPattern};
pub use profile::{Chronotype, SchedulingProfile, SleepSchedule};
pub use schedule_item::{ScheduleItem, ScheduleItemType};
pub use task::{Task, TaskMoment, TaskStatus, TaskTag};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable owning-user identifier, threaded through every repository call
/// and the per-user lock registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

/// Stable task identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// Stable schedule-item identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleItemId(pub String);

impl fmt::Display for ScheduleItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScheduleItemId {
    fn from(s: &str) -> Self {
        ScheduleItemId(s.to_string())
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
