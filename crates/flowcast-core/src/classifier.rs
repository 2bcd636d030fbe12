//! Task & Context Classifier: pure predicates over a task snapshot, no I/O.

use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::DEFAULT_SCHEDULING_WINDOW_DAYS;
use crate::model::{Task, TaskMoment};

/// What a pending task's patch changes, as far as the classifier cares.
/// Mirrors only the fields relevant to `changes_require_rescheduling`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub start_time: Option<PatchedStartTime>,
    pub priority: Option<i32>,
    pub estimated_duration_minutes: Option<i64>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A patched `startTime`: either cleared, or set to a new moment.
#[derive(Debug, Clone, Copy)]
pub enum PatchedStartTime {
    Cleared,
    Set(TaskMoment),
}

/// Target-date resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStrategy {
    Today,
    Future,
}

/// True iff `auto_schedule` and the task still needs a concrete placement:
/// either a date-only start, or only a deadline with no start at all.
pub fn needs_initial_scheduling(task: &Task) -> bool {
    if !task.auto_schedule {
        return false;
    }
    match (&task.start_time, &task.end_time) {
        (Some(start), _) => start.is_date_only(),
        (None, Some(_)) => true,
        (None, None) => false,
    }
}

/// True iff applying `patch` to `task` requires a fresh Decision Engine
/// run rather than a plain field update.
pub fn changes_require_rescheduling(task: &Task, patch: &TaskPatch) -> bool {
    if let Some(patched_start) = &patch.start_time {
        match patched_start {
            PatchedStartTime::Cleared => return true,
            PatchedStartTime::Set(moment) if moment.is_date_only() => return true,
            PatchedStartTime::Set(_) => {}
        }
    }
    if let Some(new_priority) = patch.priority {
        if (new_priority - task.priority).abs() >= 2 {
            return true;
        }
    }
    if let Some(new_duration) = patch.estimated_duration_minutes {
        if (new_duration - task.estimated_duration_minutes).abs() >= 30 {
            return true;
        }
    }
    if let Some(new_end) = patch.end_time {
        if let Some(current_deadline) = task.deadline() {
            if new_end < current_deadline {
                return true;
            }
        }
    }
    false
}

/// The calendar day the Decision Engine should start searching from.
pub fn determine_target_date(task: &Task, tz: &chrono_tz::Tz, now: DateTime<Utc>) -> Option<NaiveDate> {
    if let Some(start) = &task.start_time {
        if start.is_date_only() {
            return Some(start.date_in(tz));
        }
    }
    if task.start_time.is_none() {
        if let Some(TaskMoment::Exact(_)) = &task.end_time {
            return Some(now.with_timezone(tz).date_naive());
        }
    }
    if let Some(deadline) = task.deadline() {
        let deadline_local = deadline.with_timezone(tz).date_naive();
        if deadline_local >= now.with_timezone(tz).date_naive() {
            return Some(deadline_local);
        }
    }
    None
}

/// "today" if `target_date` matches the user's local calendar day for
/// `now`, else "future".
pub fn determine_strategy(target_date: NaiveDate, tz: &chrono_tz::Tz, now: DateTime<Utc>) -> SchedulingStrategy {
    if target_date == now.with_timezone(tz).date_naive() {
        SchedulingStrategy::Today
    } else {
        SchedulingStrategy::Future
    }
}

/// `min(7, ceil((deadline - now) / 1 day))`, falling back to the task's
/// date-only start time, defaulting to 7 when neither is available.
pub fn calculate_scheduling_window(task: &Task, now: DateTime<Utc>) -> i64 {
    if let Some(deadline) = task.deadline() {
        let remaining = deadline - now;
        let days = (remaining.num_seconds() as f64 / 86_400.0).ceil() as i64;
        return days.clamp(1, DEFAULT_SCHEDULING_WINDOW_DAYS);
    }
    if let Some(TaskMoment::DateOnly(date)) = &task.start_time {
        let today = now.date_naive();
        let days = (*date - today).num_days().max(1);
        return days.min(DEFAULT_SCHEDULING_WINDOW_DAYS);
    }
    DEFAULT_SCHEDULING_WINDOW_DAYS
}
