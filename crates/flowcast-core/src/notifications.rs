//! Notification Pump: structured, user-actionable records emitted at
//! every scheduling decision point. Creation is pure; only the outer
//! handler dispatches them to a transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{TaskId, UserId};

/// The eight notification kinds spec'd for the scheduling core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NoOptimalTime,
    TaskRescheduled,
    TaskDisplaced,
    LateWindDownConflict,
    TaskDeadlineApproaching,
    ManualTaskConflict,
    EventConflict,
    MultipleConflicts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStyle {
    Primary,
    Secondary,
    Danger,
}

/// One suggested follow-up action a client may offer the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub action_tag: String,
    pub style: ActionStyle,
    /// Opaque to the core; carried through to the transport layer.
    pub payload: serde_json::Value,
}

/// Typed metadata describing why a notification fired, filled in as far
/// as the producing decision point has the data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub old_start: Option<DateTime<Utc>>,
    pub old_end: Option<DateTime<Utc>>,
    pub new_start: Option<DateTime<Utc>>,
    pub new_end: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<i32>,
    pub tag: Option<String>,
    pub displacing_task_id: Option<TaskId>,
    pub hours_remaining: Option<f64>,
    pub conflicting_item_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub notification_type: NotificationType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub owner: UserId,
    pub task_id: Option<TaskId>,
    pub actions: Vec<NotificationAction>,
    #[serde(default)]
    pub metadata: NotificationMetadata,
}

pub fn new_id() -> String {
    crate::model::new_id()
}

impl Notification {
    pub fn no_optimal_time(owner: &UserId, task_id: &TaskId, title: &str, now: DateTime<Utc>) -> Self {
        Notification {
            id: new_id(),
            notification_type: NotificationType::NoOptimalTime,
            severity: Severity::Error,
            title: "No optimal time found".into(),
            message: format!("Could not find an optimal time to schedule '{title}' within the look-ahead horizon."),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        }
    }

    pub fn task_rescheduled(owner: &UserId, task_id: &TaskId, new_start: DateTime<Utc>, new_end: DateTime<Utc>) -> Self {
        Notification {
            id: new_id(),
            notification_type: NotificationType::TaskRescheduled,
            severity: Severity::Info,
            title: "Task rescheduled".into(),
            message: format!("Task moved to a new slot to accommodate a higher-priority task."),
            timestamp: new_start,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        }
        .with_times(None, None, Some(new_start), Some(new_end))
    }

    pub fn task_displaced(owner: &UserId, task_id: &TaskId, displacing_task_id: &TaskId, now: DateTime<Utc>) -> Self {
        let mut notification = Notification {
            id: new_id(),
            notification_type: NotificationType::TaskDisplaced,
            severity: Severity::Warning,
            title: "Task displaced".into(),
            message: "A higher-priority task has taken this slot.".into(),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        };
        notification.metadata.displacing_task_id = Some(displacing_task_id.clone());
        notification
    }

    pub fn manual_task_conflict(owner: &UserId, task_id: &TaskId, conflicting_item_id: &str, now: DateTime<Utc>) -> Self {
        let mut notification = Notification {
            id: new_id(),
            notification_type: NotificationType::ManualTaskConflict,
            severity: Severity::Error,
            title: "Conflict with a manual task".into(),
            message: "The requested placement collides with a manually pinned task.".into(),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        };
        notification.metadata.conflicting_item_ids.push(conflicting_item_id.to_string());
        notification
    }

    pub fn event_conflict(owner: &UserId, task_id: &TaskId, conflicting_item_id: &str, now: DateTime<Utc>) -> Self {
        let mut notification = Notification {
            id: new_id(),
            notification_type: NotificationType::EventConflict,
            severity: Severity::Error,
            title: "Conflict with a calendar event".into(),
            message: "The requested placement collides with a fixed calendar event.".into(),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        };
        notification.metadata.conflicting_item_ids.push(conflicting_item_id.to_string());
        notification
    }

    pub fn late_wind_down_conflict(owner: &UserId, task_id: &TaskId, now: DateTime<Utc>) -> Self {
        Notification {
            id: new_id(),
            notification_type: NotificationType::LateWindDownConflict,
            severity: Severity::Warning,
            title: "Scheduled in late wind-down".into(),
            message: "This task was placed in the two hours before bedtime.".into(),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        }
    }

    pub fn task_deadline_approaching(owner: &UserId, task_id: &TaskId, hours_remaining: f64, now: DateTime<Utc>) -> Self {
        let mut notification = Notification {
            id: new_id(),
            notification_type: NotificationType::TaskDeadlineApproaching,
            severity: Severity::Warning,
            title: "Deadline approaching".into(),
            message: format!("{hours_remaining:.1} hours remain before this task's deadline."),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        };
        notification.metadata.hours_remaining = Some(hours_remaining);
        notification
    }

    pub fn multiple_conflicts(owner: &UserId, task_id: &TaskId, conflicting_item_ids: Vec<String>, now: DateTime<Utc>) -> Self {
        let mut notification = Notification {
            id: new_id(),
            notification_type: NotificationType::MultipleConflicts,
            severity: Severity::Error,
            title: "Multiple conflicts".into(),
            message: "This placement collides with more than one existing item.".into(),
            timestamp: now,
            owner: owner.clone(),
            task_id: Some(task_id.clone()),
            actions: Vec::new(),
            metadata: NotificationMetadata::default(),
        };
        notification.metadata.conflicting_item_ids = conflicting_item_ids;
        notification
    }

    fn with_times(
        mut self,
        old_start: Option<DateTime<Utc>>,
        old_end: Option<DateTime<Utc>>,
        new_start: Option<DateTime<Utc>>,
        new_end: Option<DateTime<Utc>>,
    ) -> Self {
        self.metadata.old_start = old_start;
        self.metadata.old_end = old_end;
        self.metadata.new_start = new_start;
        self.metadata.new_end = new_end;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_rescheduled_carries_new_times_in_metadata() {
        let owner = UserId::from("u1");
        let task_id = TaskId::from("t1");
        let start = Utc::now();
        let end = start + chrono::Duration::hours(1);
        let n = Notification::task_rescheduled(&owner, &task_id, start, end);
        assert_eq!(n.metadata.new_start, Some(start));
        assert_eq!(n.metadata.new_end, Some(end));
        assert_eq!(n.notification_type, NotificationType::TaskRescheduled);
    }

    #[test]
    fn task_displaced_records_the_displacing_task() {
        let owner = UserId::from("u1");
        let task_id = TaskId::from("t1");
        let displacer = TaskId::from("t2");
        let n = Notification::task_displaced(&owner, &task_id, &displacer, Utc::now());
        assert_eq!(n.metadata.displacing_task_id, Some(displacer));
    }
}
