//! Calendar placement: the mirror of a placed `Task`, or an immovable event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ScheduleItemId, TaskId, UserId};

/// Whether a `ScheduleItem` represents a task placement or a fixed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleItemType {
    Task,
    Event,
}

/// A calendar placement. Events are immovable; task items mirror their
/// backing `Task` and are displaceable by the Cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ScheduleItemId,
    pub owner: UserId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub item_type: ScheduleItemType,
    pub task_id: Option<TaskId>,
}

impl ScheduleItem {
    /// Overlap check against `[start, end)`, with the 10-minute event
    /// buffer applied to event items only (spec §4.3 step 4).
    pub fn conflicts_with(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        event_buffer: chrono::Duration,
    ) -> bool {
        let (item_start, item_end) = match self.item_type {
            ScheduleItemType::Event => (self.start_time - event_buffer, self.end_time + event_buffer),
            ScheduleItemType::Task => (self.start_time, self.end_time),
        };
        item_start < end && item_end > start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(item_type: ScheduleItemType, start: &str, end: &str) -> ScheduleItem {
        ScheduleItem {
            id: ScheduleItemId::from("s1"),
            owner: UserId::from("u1"),
            title: "x".into(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            item_type,
            task_id: None,
        }
    }

    #[test]
    fn event_buffer_widens_conflict_window() {
        let event = item(
            ScheduleItemType::Event,
            "2026-07-28T10:00:00Z",
            "2026-07-28T11:00:00Z",
        );
        let buffer = Duration::minutes(10);
        // 11:05 start is within the 10-min buffer past 11:00 -> conflict.
        let start = "2026-07-28T11:05:00Z".parse().unwrap();
        let end = "2026-07-28T11:35:00Z".parse().unwrap();
        assert!(event.conflicts_with(start, end, buffer));

        // 11:15 start clears the buffer -> no conflict.
        let start = "2026-07-28T11:15:00Z".parse().unwrap();
        let end = "2026-07-28T11:45:00Z".parse().unwrap();
        assert!(!event.conflicts_with(start, end, buffer));
    }

    #[test]
    fn task_items_use_verbatim_interval() {
        let task = item(
            ScheduleItemType::Task,
            "2026-07-28T10:00:00Z",
            "2026-07-28T11:00:00Z",
        );
        let buffer = Duration::minutes(10);
        let start = "2026-07-28T11:00:00Z".parse().unwrap();
        let end = "2026-07-28T12:00:00Z".parse().unwrap();
        assert!(!task.conflicts_with(start, end, buffer));
    }
}
