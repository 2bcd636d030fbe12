//! Displacement & Cascade: when a new placement or event collides with
//! existing auto-scheduled tasks, decide whether to displace each, then
//! re-run the Decision Engine for the displaced. Single layer, no
//! transitive displacement.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::constants::event_buffer;
use crate::engine::{find_optimal_slot, EngineInputs, TaskRequest};
use crate::model::{ScheduleItem, ScheduleItemId, ScheduleItemType, Task, TaskId, TaskStatus};
use crate::notifications::Notification;

/// One existing auto-scheduled task found to conflict with the
/// originating placement or event.
pub struct ConflictingTask<'a> {
    pub task: &'a Task,
    pub schedule_item: &'a ScheduleItem,
}

/// Outcome of evaluating one conflicting task against the incoming
/// placement.
pub enum CascadeOutcome {
    /// E was re-placed; here are its new times.
    Rescheduled {
        task_id: TaskId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    },
    /// E could not be re-placed; it stays where it was.
    KeptInPlace { task_id: TaskId },
    /// The incoming placement must itself yield; E is not displaced.
    IncomingMustYield {
        task_id: TaskId,
        blocking_item_id: ScheduleItemId,
    },
}

/// True iff the incoming task N displaces existing task E (spec §4.5):
/// `N.priority > E.priority`, or equal priority with N's deadline
/// earlier than E's.
pub fn displaces(
    incoming_priority: i32,
    incoming_end: DateTime<Utc>,
    existing_priority: i32,
    existing_end: DateTime<Utc>,
) -> bool {
    if incoming_priority > existing_priority {
        return true;
    }
    incoming_priority == existing_priority && incoming_end < existing_end
}

/// Only `pending`, auto-scheduled tasks are ever displaced.
fn is_displaceable(task: &Task) -> bool {
    task.auto_schedule && task.status == TaskStatus::Pending
}

/// Strip from `calendar` the Task-type mirrors of tasks the incoming
/// placement is entitled to displace outright (strictly lower priority),
/// so the incoming task's own Decision Engine search can land on those
/// hours (spec §4.5 case (a): "a newly scheduled task lands on an
/// interval that overlaps existing auto-scheduled tasks"). Equal-priority
/// deadline ties aren't resolved here -- the incoming task's own deadline
/// isn't fixed until a slot is chosen -- so equal-priority items remain
/// hard blockers; the precise `displaces` check still runs afterward in
/// the cascade once the incoming placement is known.
pub fn displaceable_calendar(calendar: &[ScheduleItem], tasks: &[Task], incoming_priority: i32) -> Vec<ScheduleItem> {
    calendar
        .iter()
        .filter(|item| {
            if item.item_type != ScheduleItemType::Task {
                return true;
            }
            let Some(task_id) = &item.task_id else {
                return true;
            };
            let Some(task) = tasks.iter().find(|t| &t.id == task_id) else {
                return true;
            };
            !(is_displaceable(task) && task.priority < incoming_priority)
        })
        .cloned()
        .collect()
}

/// Build the `IncomingMustYield` outcome plus the matching
/// `manual_task_conflict`/`event_conflict` notification for a blocking
/// item that cannot be displaced.
fn cannot_displace(conflicting: &ConflictingTask, now: DateTime<Utc>) -> (CascadeOutcome, Vec<Notification>) {
    let existing = conflicting.task;
    let item = conflicting.schedule_item;
    warn!(task_id = %existing.id, item_id = %item.id, "placement blocked by an immovable item");
    let notification = match item.item_type {
        ScheduleItemType::Event => Notification::event_conflict(&existing.owner, &existing.id, &item.id.to_string(), now),
        ScheduleItemType::Task => Notification::manual_task_conflict(&existing.owner, &existing.id, &item.id.to_string(), now),
    };
    (
        CascadeOutcome::IncomingMustYield {
            task_id: existing.id.clone(),
            blocking_item_id: item.id.clone(),
        },
        vec![notification],
    )
}

/// Evaluate one conflicting existing task: decide displacement, and if
/// displaced, search for a replacement slot via the Decision Engine. Only
/// the existing task's own ID is excluded (no chasing a cycle); the
/// incoming task's placement stays a real calendar blocker, so the
/// displaced task cannot re-land on the exact slot it just yielded.
pub fn evaluate_conflict(
    conflicting: &ConflictingTask,
    incoming_priority: i32,
    incoming_end: DateTime<Utc>,
    now: DateTime<Utc>,
    inputs: &EngineInputs,
) -> (CascadeOutcome, Vec<Notification>) {
    let existing = conflicting.task;
    if !is_displaceable(existing) {
        return cannot_displace(conflicting, now);
    }

    let existing_end = match existing.scheduled_end() {
        Some(end) => end,
        None => return cannot_displace(conflicting, now),
    };

    if !displaces(incoming_priority, incoming_end, existing.priority, existing_end) {
        return cannot_displace(conflicting, now);
    }

    let exclude = vec![existing.id.clone()];
    let request = TaskRequest {
        owner: existing.owner.clone(),
        tag: existing.tag,
        priority: existing.priority,
        duration_minutes: existing.estimated_duration_minutes,
        deadline: existing.deadline(),
    };
    let target_date = now.with_timezone(inputs.tz).date_naive();
    let replacement = find_optimal_slot(&request, target_date, 0, &exclude, now, inputs);

    match replacement {
        Some((new_start, new_end)) => {
            info!(task_id = %existing.id, "displaced task rescheduled");
            let notification = Notification::task_rescheduled(&existing.owner, &existing.id, new_start, new_end);
            (
                CascadeOutcome::Rescheduled {
                    task_id: existing.id.clone(),
                    new_start,
                    new_end,
                },
                vec![notification],
            )
        }
        None => {
            warn!(task_id = %existing.id, "displaced task could not be re-placed");
            let notification = Notification::no_optimal_time(&existing.owner, &existing.id, &existing.title, now);
            (
                CascadeOutcome::KeptInPlace {
                    task_id: existing.id.clone(),
                },
                vec![notification],
            )
        }
    }
}

/// Find auto-scheduled tasks whose mirror `ScheduleItem` overlaps
/// `[start, end)` (widened by the event buffer when `is_event`).
pub fn find_conflicting_tasks<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_event: bool,
    tasks: &'a [Task],
    schedule: &'a [ScheduleItem],
    exclude: &TaskId,
) -> Vec<ConflictingTask<'a>> {
    let buffer = if is_event { event_buffer() } else { Duration::zero() };
    schedule
        .iter()
        .filter(|item| item.item_type == ScheduleItemType::Task)
        .filter_map(|item| {
            let task_id = item.task_id.as_ref()?;
            if task_id == exclude {
                return None;
            }
            if !item.conflicts_with(start, end, buffer) {
                return None;
            }
            let task = tasks.iter().find(|t| &t.id == task_id)?;
            Some(ConflictingTask {
                task,
                schedule_item: item,
            })
        })
        .collect()
}
