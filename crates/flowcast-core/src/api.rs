//! Core API Surface: the four entry points a transport layer calls into.
//! Each acquires the caller's per-user lock, builds a `SchedulingContext`
//! as needed, drives the Decision Engine and Cascade, and persists the
//! result before releasing the lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::cascade::{evaluate_conflict, find_conflicting_tasks, CascadeOutcome};
use crate::classifier::{changes_require_rescheduling, determine_target_date, needs_initial_scheduling, TaskPatch};
use crate::constants::DEADLINE_APPROACHING_HOURS;
use crate::engine::{find_optimal_slot, EngineInputs, TaskRequest};
use crate::error::{CoreError, Result, SchedulingError, ValidationError};
use crate::locking::LockRegistry;
use crate::energy::update_historical_patterns;
use crate::model::{new_id, EnergySample, ScheduleItem, ScheduleItemId, ScheduleItemType, SleepSchedule, Task, TaskId, TaskMoment, TaskStatus, TaskTag, UserId};
use crate::notifications::Notification;
use crate::repository::{EnergyRepository, ScheduleRepository, TaskRepository, UserRepository};

fn validate_hour(hour: u32) -> Result<()> {
    if hour > 23 {
        return Err(ValidationError::HourOutOfRange { hour }.into());
    }
    Ok(())
}

fn validate_energy_level(level: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&level) {
        return Err(ValidationError::EnergyOutOfRange { level }.into());
    }
    Ok(())
}

/// Caller-supplied fields for a new task. `start_time`/`end_time` are
/// raw UTC instants; they are classified into `TaskMoment` against the
/// user's timezone once the profile is loaded.
pub struct NewTaskSpec {
    pub title: String,
    pub description: Option<String>,
    pub estimated_duration_minutes: i64,
    pub priority: i32,
    pub tag: TaskTag,
    pub auto_schedule: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn validate_duration(minutes: i64) -> Result<()> {
    if !(1..=720).contains(&minutes) {
        return Err(ValidationError::DurationOutOfRange { minutes }.into());
    }
    Ok(())
}

fn validate_priority(priority: i32) -> Result<()> {
    if !(1..=5).contains(&priority) {
        return Err(ValidationError::PriorityOutOfRange { priority }.into());
    }
    Ok(())
}

/// A repository bundle implementing every port `FlowCastCore` needs.
/// `InMemoryStore` satisfies this trivially; a production store would
/// implement the four ports over a real database and satisfy it too.
pub trait Store: TaskRepository + ScheduleRepository + EnergyRepository + UserRepository {}
impl<T: TaskRepository + ScheduleRepository + EnergyRepository + UserRepository> Store for T {}

pub struct FlowCastCore<S: Store> {
    store: Arc<S>,
    locks: LockRegistry,
}

impl<S: Store> FlowCastCore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: LockRegistry::new(),
        }
    }

    async fn profile_or_default(&self, owner: &UserId) -> Result<(chrono_tz::Tz, SleepSchedule)> {
        match self.store.get_profile(owner).await? {
            Some(profile) => Ok((profile.timezone, profile.sleep_schedule)),
            None => Err(CoreError::NotFound {
                kind: "SchedulingProfile",
                id: owner.to_string(),
            }),
        }
    }

    async fn engine_inputs_owned(&self, owner: &UserId, now: DateTime<Utc>) -> Result<(chrono_tz::Tz, SleepSchedule, Vec<ScheduleItem>, Vec<crate::model::EnergySample>, Vec<crate::model::HistoricalEnergyPattern>)> {
        let (tz, sleep) = self.profile_or_default(owner).await?;
        let calendar = self.store.list_items(owner).await?;
        let today_samples = self.store.today_samples(owner, now.with_timezone(&tz).date_naive()).await?;
        let historical_rows = self.store.patterns(owner).await?;
        Ok((tz, sleep, calendar, today_samples, historical_rows))
    }

    /// `createTask(spec) -> Task + notifications`.
    #[instrument(skip(self, spec))]
    pub async fn create_task(&self, owner: &UserId, spec: NewTaskSpec, now: DateTime<Utc>) -> Result<(Task, Vec<Notification>)> {
        validate_duration(spec.estimated_duration_minutes)?;
        validate_priority(spec.priority)?;

        let _guard = self.locks.lock(owner).await;
        let (tz, sleep, calendar, today_samples, historical_rows) = self.engine_inputs_owned(owner, now).await?;

        let task = Task {
            id: TaskId::from(new_id().as_str()),
            owner: owner.clone(),
            title: spec.title,
            description: spec.description,
            estimated_duration_minutes: spec.estimated_duration_minutes,
            priority: spec.priority,
            tag: spec.tag,
            auto_schedule: spec.auto_schedule,
            status: TaskStatus::Pending,
            start_time: spec.start_time.map(|at| TaskMoment::classify(at, &tz)),
            end_time: spec.end_time.map(|at| TaskMoment::classify(at, &tz)),
            created_at: now,
            updated_at: now,
        };

        if !needs_initial_scheduling(&task) {
            self.store.put_task(task.clone()).await?;
            return Ok((task, Vec::new()));
        }

        let target_date = match determine_target_date(&task, &tz, now) {
            Some(date) => date,
            None => now.with_timezone(&tz).date_naive(),
        };
        let deadline = task.deadline();
        let request = TaskRequest {
            owner: owner.clone(),
            tag: task.tag,
            priority: task.priority,
            duration_minutes: task.estimated_duration_minutes,
            deadline,
        };
        // Let the search land on hours held by tasks this one outranks
        // outright; `run_cascade` below evicts whoever actually ends up
        // conflicting with the chosen placement.
        let existing_tasks = self.store.list_tasks(owner).await?;
        let negotiable_calendar = crate::cascade::displaceable_calendar(&calendar, &existing_tasks, task.priority);
        let inputs = EngineInputs {
            sleep: &sleep,
            tz: &tz,
            calendar: &negotiable_calendar,
            today_samples: &today_samples,
            historical_rows: &historical_rows,
        };
        let slot = find_optimal_slot(&request, target_date, 0, &[], now, &inputs);

        let Some((start, _end)) = slot else {
            return Err(CoreError::Scheduling(SchedulingError::NoOptimalTime {
                task_id: task.id.to_string(),
            }));
        };

        let mut placed = task;
        placed.place(start);
        self.store.put_task(placed.clone()).await?;
        let item = ScheduleItem {
            id: ScheduleItemId::from(new_id().as_str()),
            owner: owner.clone(),
            title: placed.title.clone(),
            start_time: start,
            end_time: placed.scheduled_end().unwrap_or(start),
            item_type: ScheduleItemType::Task,
            task_id: Some(placed.id.clone()),
        };
        self.store.put_item(item.clone()).await?;

        let mut notifications = placement_notifications(owner, &placed.id, start, item.end_time, deadline, &sleep, &tz, now);
        notifications.append(
            &mut self
                .run_cascade(owner, &placed.id, placed.priority, item.end_time, now, &tz, &sleep)
                .await?,
        );

        Ok((placed, notifications))
    }

    /// `updateTask(id, patch) -> Task`.
    #[instrument(skip(self, patch))]
    pub async fn update_task(&self, owner: &UserId, id: &TaskId, patch: TaskPatch, now: DateTime<Utc>) -> Result<(Task, Vec<Notification>)> {
        let _guard = self.locks.lock(owner).await;
        let mut task = self
            .store
            .get_task(owner, id)
            .await?
            .ok_or_else(|| CoreError::NotFound { kind: "Task", id: id.to_string() })?;

        let needs_reschedule = changes_require_rescheduling(&task, &patch);
        apply_patch(&mut task, &patch, now);

        if !needs_reschedule {
            self.store.put_task(task.clone()).await?;
            return Ok((task, Vec::new()));
        }

        let (tz, sleep, calendar, today_samples, historical_rows) = self.engine_inputs_owned(owner, now).await?;
        let exclude = vec![task.id.clone()];
        let target_date = determine_target_date(&task, &tz, now).unwrap_or_else(|| now.with_timezone(&tz).date_naive());
        let deadline = task.deadline();
        let request = TaskRequest {
            owner: owner.clone(),
            tag: task.tag,
            priority: task.priority,
            duration_minutes: task.estimated_duration_minutes,
            deadline,
        };
        let existing_tasks = self.store.list_tasks(owner).await?;
        let negotiable_calendar = crate::cascade::displaceable_calendar(&calendar, &existing_tasks, task.priority);
        let inputs = EngineInputs {
            sleep: &sleep,
            tz: &tz,
            calendar: &negotiable_calendar,
            today_samples: &today_samples,
            historical_rows: &historical_rows,
        };
        let slot = find_optimal_slot(&request, target_date, 0, &exclude, now, &inputs);

        match slot {
            Some((start, _end)) => {
                task.place(start);
                self.store.put_task(task.clone()).await?;
                let item = ScheduleItem {
                    id: self
                        .store
                        .get_item_for_task(owner, &task.id)
                        .await?
                        .map(|existing| existing.id)
                        .unwrap_or_else(|| ScheduleItemId::from(new_id().as_str())),
                    owner: owner.clone(),
                    title: task.title.clone(),
                    start_time: start,
                    end_time: task.scheduled_end().unwrap_or(start),
                    item_type: ScheduleItemType::Task,
                    task_id: Some(task.id.clone()),
                };
                self.store.put_item(item.clone()).await?;
                let mut notifications = placement_notifications(owner, &task.id, start, item.end_time, deadline, &sleep, &tz, now);
                notifications.append(
                    &mut self
                        .run_cascade(owner, &task.id, task.priority, item.end_time, now, &tz, &sleep)
                        .await?,
                );
                Ok((task, notifications))
            }
            None => {
                // Preserved-with-notification: leave the task's previous
                // placement untouched and surface the refusal.
                self.store.put_task(task.clone()).await?;
                let notification = Notification::no_optimal_time(owner, &task.id, &task.title, now);
                Ok((task, vec![notification]))
            }
        }
    }

    /// `rescheduleTask(id) -> Task | 409`.
    #[instrument(skip(self))]
    pub async fn reschedule_task(&self, owner: &UserId, id: &TaskId, now: DateTime<Utc>) -> Result<(Task, Vec<Notification>)> {
        let _guard = self.locks.lock(owner).await;
        let mut task = self
            .store
            .get_task(owner, id)
            .await?
            .ok_or_else(|| CoreError::NotFound { kind: "Task", id: id.to_string() })?;

        let (tz, sleep, calendar, today_samples, historical_rows) = self.engine_inputs_owned(owner, now).await?;
        let exclude = vec![task.id.clone()];
        let target_date = determine_target_date(&task, &tz, now).unwrap_or_else(|| now.with_timezone(&tz).date_naive());
        let deadline = task.deadline();
        let request = TaskRequest {
            owner: owner.clone(),
            tag: task.tag,
            priority: task.priority,
            duration_minutes: task.estimated_duration_minutes,
            deadline,
        };
        let existing_tasks = self.store.list_tasks(owner).await?;
        let negotiable_calendar = crate::cascade::displaceable_calendar(&calendar, &existing_tasks, task.priority);
        let inputs = EngineInputs {
            sleep: &sleep,
            tz: &tz,
            calendar: &negotiable_calendar,
            today_samples: &today_samples,
            historical_rows: &historical_rows,
        };
        let slot = find_optimal_slot(&request, target_date, 0, &exclude, now, &inputs);

        let Some((start, _end)) = slot else {
            return Err(CoreError::Scheduling(SchedulingError::NoOptimalTime {
                task_id: task.id.to_string(),
            }));
        };

        task.place(start);
        self.store.put_task(task.clone()).await?;
        let item = ScheduleItem {
            id: self
                .store
                .get_item_for_task(owner, &task.id)
                .await?
                .map(|existing| existing.id)
                .unwrap_or_else(|| ScheduleItemId::from(new_id().as_str())),
            owner: owner.clone(),
            title: task.title.clone(),
            start_time: start,
            end_time: task.scheduled_end().unwrap_or(start),
            item_type: ScheduleItemType::Task,
            task_id: Some(task.id.clone()),
        };
        self.store.put_item(item.clone()).await?;
        let mut notifications = placement_notifications(owner, &task.id, start, item.end_time, deadline, &sleep, &tz, now);
        notifications.append(
            &mut self
                .run_cascade(owner, &task.id, task.priority, item.end_time, now, &tz, &sleep)
                .await?,
        );
        Ok((task, notifications))
    }

    /// Record an `EnergySample` and recompute the user's historical
    /// per-hour running averages from every sample on record
    /// (`updateHistoricalPatterns`, spec §4.2).
    #[instrument(skip(self, sample))]
    pub async fn record_energy_sample(&self, owner: &UserId, sample: EnergySample) -> Result<()> {
        validate_hour(sample.hour)?;
        validate_energy_level(sample.energy_level)?;

        let _guard = self.locks.lock(owner).await;
        self.store.put_sample(sample).await?;
        let all_samples = self.store.all_samples(owner).await?;
        let existing = self.store.patterns(owner).await?;
        let patterns = update_historical_patterns(&all_samples, owner, &existing);
        self.store.put_patterns(owner, patterns).await?;
        Ok(())
    }

    /// All tasks owned by `owner`, regardless of placement status.
    pub async fn list_tasks(&self, owner: &UserId) -> Result<Vec<Task>> {
        self.store.list_tasks(owner).await
    }

    /// A single task by id.
    pub async fn get_task(&self, owner: &UserId, id: &TaskId) -> Result<Option<Task>> {
        self.store.get_task(owner, id).await
    }

    /// Every calendar placement (placed tasks and fixed events) for `owner`.
    pub async fn list_schedule(&self, owner: &UserId) -> Result<Vec<ScheduleItem>> {
        self.store.list_items(owner).await
    }

    /// The user's current historical energy patterns.
    pub async fn list_patterns(&self, owner: &UserId) -> Result<Vec<crate::model::HistoricalEnergyPattern>> {
        self.store.patterns(owner).await
    }

    /// The user's scheduling profile (timezone + sleep schedule), if set.
    pub async fn get_profile(&self, owner: &UserId) -> Result<Option<crate::model::SchedulingProfile>> {
        self.store.get_profile(owner).await
    }

    /// Create or replace the user's scheduling profile.
    pub async fn put_profile(&self, profile: crate::model::SchedulingProfile) -> Result<()> {
        self.store.put_profile(profile).await
    }

    /// `onNewEvent(event)`: widen by the event buffer, find overlapping
    /// auto-tasks, run the Cascade for each.
    #[instrument(skip(self, event))]
    pub async fn on_new_event(&self, owner: &UserId, event: ScheduleItem, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let _guard = self.locks.lock(owner).await;
        self.store.put_item(event.clone()).await?;

        let (tz, sleep, calendar, today_samples, historical_rows) = self.engine_inputs_owned(owner, now).await?;
        let tasks = self.store.list_tasks(owner).await?;
        let placeholder_id = TaskId::from("__event__");
        let conflicts = find_conflicting_tasks(event.start_time, event.end_time, true, &tasks, &calendar, &placeholder_id);

        let mut notifications = Vec::new();
        if conflicts.len() > 1 {
            let ids = conflicts.iter().map(|c| c.schedule_item.id.to_string()).collect();
            notifications.push(Notification::multiple_conflicts(owner, &placeholder_id, ids, now));
        }
        for conflict in &conflicts {
            let inputs = EngineInputs {
                sleep: &sleep,
                tz: &tz,
                calendar: &calendar,
                today_samples: &today_samples,
                historical_rows: &historical_rows,
            };
            let (outcome, mut emitted) = evaluate_conflict(conflict, i32::MAX, event.end_time, now, &inputs);
            match outcome {
                CascadeOutcome::Rescheduled { task_id, new_start, new_end } => {
                    if let Some(mut task) = self.store.get_task(owner, &task_id).await? {
                        task.place(new_start);
                        self.store.put_task(task.clone()).await?;
                        let item = ScheduleItem {
                            id: self
                                .store
                                .get_item_for_task(owner, &task_id)
                                .await?
                                .map(|existing| existing.id)
                                .unwrap_or_else(|| ScheduleItemId::from(new_id().as_str())),
                            owner: owner.clone(),
                            title: task.title.clone(),
                            start_time: new_start,
                            end_time: new_end,
                            item_type: ScheduleItemType::Task,
                            task_id: Some(task_id),
                        };
                        self.store.put_item(item).await?;
                    }
                }
                CascadeOutcome::IncomingMustYield { blocking_item_id, .. } => {
                    return Err(CoreError::Scheduling(SchedulingError::ConflictWithImmovable {
                        task_id: event.id.to_string(),
                        item_id: blocking_item_id.to_string(),
                    }));
                }
                CascadeOutcome::KeptInPlace { .. } => {}
            }
            notifications.append(&mut emitted);
        }
        Ok(notifications)
    }

    /// `removeEvent(id)`: drop a calendar event, then re-run the Decision
    /// Engine for every placed, pending, auto-scheduled task of this user.
    /// A task only moves if the rerun yields a slot strictly different from
    /// (and therefore, since freeing calendar time can only add candidates,
    /// no worse than) its current placement; tasks with no better slot are
    /// left untouched.
    #[instrument(skip(self))]
    pub async fn remove_event(&self, owner: &UserId, id: &ScheduleItemId, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let _guard = self.locks.lock(owner).await;
        self.store.delete_item(owner, id).await?;

        let (tz, sleep, calendar, today_samples, historical_rows) = self.engine_inputs_owned(owner, now).await?;
        let tasks = self.store.list_tasks(owner).await?;

        let mut notifications = Vec::new();
        for task in tasks
            .into_iter()
            .filter(|t| t.auto_schedule && t.status == TaskStatus::Pending && t.scheduled_start().is_some())
        {
            let current_start = task.scheduled_start().expect("filtered above");
            let exclude = vec![task.id.clone()];
            let target_date = determine_target_date(&task, &tz, now).unwrap_or_else(|| now.with_timezone(&tz).date_naive());
            let request = TaskRequest {
                owner: owner.clone(),
                tag: task.tag,
                priority: task.priority,
                duration_minutes: task.estimated_duration_minutes,
                deadline: task.deadline(),
            };
            let inputs = EngineInputs {
                sleep: &sleep,
                tz: &tz,
                calendar: &calendar,
                today_samples: &today_samples,
                historical_rows: &historical_rows,
            };
            let Some((new_start, new_end)) = find_optimal_slot(&request, target_date, 0, &exclude, now, &inputs) else {
                continue;
            };
            if new_start == current_start {
                continue;
            }

            let mut moved = task.clone();
            moved.place(new_start);
            self.store.put_task(moved.clone()).await?;
            let item = ScheduleItem {
                id: self
                    .store
                    .get_item_for_task(owner, &moved.id)
                    .await?
                    .map(|existing| existing.id)
                    .unwrap_or_else(|| ScheduleItemId::from(new_id().as_str())),
                owner: owner.clone(),
                title: moved.title.clone(),
                start_time: new_start,
                end_time: new_end,
                item_type: ScheduleItemType::Task,
                task_id: Some(moved.id.clone()),
            };
            self.store.put_item(item).await?;
            notifications.push(Notification::task_rescheduled(owner, &moved.id, new_start, new_end));
        }
        Ok(notifications)
    }

    /// Find auto-scheduled tasks whose mirror conflicts with `[.., end)`
    /// at `end`'s owning item and run displacement for each.
    async fn run_cascade(
        &self,
        owner: &UserId,
        new_task_id: &TaskId,
        new_priority: i32,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
        tz: &chrono_tz::Tz,
        sleep: &SleepSchedule,
    ) -> Result<Vec<Notification>> {
        let new_item = self.store.get_item_for_task(owner, new_task_id).await?;
        let Some(new_item) = new_item else {
            return Ok(Vec::new());
        };
        let tasks = self.store.list_tasks(owner).await?;
        let calendar = self.store.list_items(owner).await?;
        let today_samples = self.store.today_samples(owner, now.with_timezone(tz).date_naive()).await?;
        let historical_rows = self.store.patterns(owner).await?;

        let conflicts = find_conflicting_tasks(new_item.start_time, new_item.end_time, false, &tasks, &calendar, new_task_id);
        let mut notifications = Vec::new();
        if conflicts.len() > 1 {
            let ids = conflicts.iter().map(|c| c.schedule_item.id.to_string()).collect();
            notifications.push(Notification::multiple_conflicts(owner, new_task_id, ids, now));
        }
        for conflict in &conflicts {
            let inputs = EngineInputs {
                sleep,
                tz,
                calendar: &calendar,
                today_samples: &today_samples,
                historical_rows: &historical_rows,
            };
            let (outcome, mut emitted) = evaluate_conflict(conflict, new_priority, new_end, now, &inputs);
            match outcome {
                CascadeOutcome::Rescheduled { task_id, new_start, new_end } => {
                    if let Some(mut existing) = self.store.get_task(owner, &task_id).await? {
                        existing.place(new_start);
                        self.store.put_task(existing.clone()).await?;
                        let item = ScheduleItem {
                            id: conflict.schedule_item.id.clone(),
                            owner: owner.clone(),
                            title: existing.title.clone(),
                            start_time: new_start,
                            end_time: new_end,
                            item_type: ScheduleItemType::Task,
                            task_id: Some(task_id),
                        };
                        self.store.put_item(item).await?;
                    }
                }
                CascadeOutcome::IncomingMustYield { blocking_item_id, .. } => {
                    return Err(CoreError::Scheduling(SchedulingError::ConflictWithImmovable {
                        task_id: new_task_id.to_string(),
                        item_id: blocking_item_id.to_string(),
                    }));
                }
                CascadeOutcome::KeptInPlace { .. } => {}
            }
            notifications.append(&mut emitted);
        }
        Ok(notifications)
    }
}

/// Post-placement notifications that don't gate the placement itself:
/// a late wind-down concession, and a deadline closing in on the
/// scheduled end.
fn placement_notifications(
    owner: &UserId,
    task_id: &TaskId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    sleep: &SleepSchedule,
    tz: &chrono_tz::Tz,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    let local_hour = {
        use chrono::Timelike;
        start.with_timezone(tz).hour()
    };
    if sleep.is_late_wind_down_hour(local_hour) {
        notifications.push(Notification::late_wind_down_conflict(owner, task_id, now));
    }

    if let Some(deadline) = deadline {
        let hours_remaining = (deadline - end).num_seconds() as f64 / 3600.0;
        if (0.0..=DEADLINE_APPROACHING_HOURS).contains(&hours_remaining) {
            notifications.push(Notification::task_deadline_approaching(owner, task_id, hours_remaining, now));
        }
    }

    notifications
}

fn apply_patch(task: &mut Task, patch: &TaskPatch, now: DateTime<Utc>) {
    if let Some(patched_start) = &patch.start_time {
        use crate::classifier::PatchedStartTime;
        task.start_time = match patched_start {
            PatchedStartTime::Cleared => None,
            PatchedStartTime::Set(moment) => Some(*moment),
        };
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(duration) = patch.estimated_duration_minutes {
        task.estimated_duration_minutes = duration;
    }
    if let Some(end_time) = patch.end_time {
        task.end_time = Some(TaskMoment::Exact(end_time));
    }
    task.updated_at = now;
}
