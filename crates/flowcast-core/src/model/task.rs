//! Task type: identity, scheduling hints, and lifecycle.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{TaskId, UserId};

/// A timestamp that may be an exact instant or "any hour on this day".
///
/// Preserves the source's "bare midnight timestamp means any hour today"
/// convention at the boundary while keeping downstream code from ever
/// re-inspecting time-of-day bits (Design Notes, "date-only ambiguity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskMoment {
    Exact(DateTime<Utc>),
    DateOnly(NaiveDate),
}

impl TaskMoment {
    /// Classify a raw UTC timestamp against a user's timezone: exactly
    /// midnight in that timezone means "date-only".
    pub fn classify(at: DateTime<Utc>, tz: &chrono_tz::Tz) -> Self {
        let local = at.with_timezone(tz);
        use chrono::Timelike;
        if local.hour() == 0 && local.minute() == 0 && local.second() == 0 {
            Self::DateOnly(local.date_naive())
        } else {
            Self::Exact(at)
        }
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::DateOnly(_))
    }

    /// The calendar date this moment falls on, in the given timezone.
    pub fn date_in(&self, tz: &chrono_tz::Tz) -> NaiveDate {
        match self {
            Self::Exact(at) => at.with_timezone(tz).date_naive(),
            Self::DateOnly(date) => *date,
        }
    }
}

/// Coarse task category driving the required energy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTag {
    Deep,
    Creative,
    Admin,
    Personal,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// A task to be scheduled (or already placed) on a user's calendar.
///
/// Invariant: if `start_time` is `Some(TaskMoment::Exact(_))`, then
/// `end_time` is `Some(start_time + estimated_duration)` once placed.
/// Before placement, `end_time` doubles as the task's deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    /// Whole minutes, 1..=720.
    pub estimated_duration_minutes: i64,
    /// 1..=5, 5 highest.
    pub priority: i32,
    pub tag: TaskTag,
    pub auto_schedule: bool,
    pub status: TaskStatus,
    /// Present once the engine (or a caller) has placed the task, or when
    /// the caller supplied a date-only hint for initial scheduling.
    pub start_time: Option<TaskMoment>,
    /// Overloads as a deadline before placement and as the scheduled end
    /// after placement (spec.md §3).
    pub end_time: Option<TaskMoment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Exact scheduled end time, once placed (`start_time` is `Exact` and
    /// `end_time` mirrors it). Returns `None` before placement.
    pub fn scheduled_end(&self) -> Option<DateTime<Utc>> {
        match (self.start_time, self.end_time) {
            (Some(TaskMoment::Exact(start)), Some(TaskMoment::Exact(_))) => {
                Some(start + Duration::minutes(self.estimated_duration_minutes))
            }
            _ => None,
        }
    }

    /// Exact scheduled start time, once placed.
    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        match self.start_time {
            Some(TaskMoment::Exact(start)) => Some(start),
            _ => None,
        }
    }

    /// The deadline, if one was set and the task has not yet mirrored it
    /// into a scheduled end.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.end_time {
            Some(TaskMoment::Exact(end)) if self.scheduled_start().is_none() => Some(end),
            _ => None,
        }
    }

    /// Place the task at an exact interval, mirroring `start..start+duration`
    /// into `start_time`/`end_time` per the Task invariant.
    pub fn place(&mut self, start: DateTime<Utc>) {
        self.start_time = Some(TaskMoment::Exact(start));
        self.end_time = Some(TaskMoment::Exact(
            start + Duration::minutes(self.estimated_duration_minutes),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    #[test]
    fn date_only_classification_uses_local_midnight() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 2026-07-28T04:00:00Z is 2026-07-28T00:00:00 in America/New_York.
        let midnight_utc = "2026-07-28T04:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let moment = TaskMoment::classify(midnight_utc, &tz);
        assert!(moment.is_date_only());

        let not_midnight = "2026-07-28T14:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let moment = TaskMoment::classify(not_midnight, &tz);
        assert!(!moment.is_date_only());
    }

    #[test]
    fn place_mirrors_start_and_duration_into_end() {
        let mut task = Task {
            id: TaskId::from("t1"),
            owner: UserId::from("u1"),
            title: "Write report".into(),
            description: None,
            estimated_duration_minutes: 60,
            priority: 3,
            tag: TaskTag::Deep,
            auto_schedule: true,
            status: TaskStatus::Pending,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let start = "2026-07-28T14:00:00Z".parse::<DateTime<Utc>>().unwrap();
        task.place(start);
        assert_eq!(task.scheduled_start(), Some(start));
        assert_eq!(
            task.scheduled_end(),
            Some(start + Duration::minutes(60))
        );
    }
}
