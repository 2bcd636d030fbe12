//! Persistence ports. The scheduling core never talks to a concrete
//! database; it reads and writes through these traits, touched only at
//! the boundaries of a decision (snapshot in, result out).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::model::{EnergySample, HistoricalEnergyPattern, ScheduleItem, ScheduleItemId, SchedulingProfile, Task, TaskId, UserId};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_task(&self, owner: &UserId, id: &TaskId) -> Result<Option<Task>>;
    async fn list_tasks(&self, owner: &UserId) -> Result<Vec<Task>>;
    async fn put_task(&self, task: Task) -> Result<()>;
    async fn delete_task(&self, owner: &UserId, id: &TaskId) -> Result<()>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn list_items(&self, owner: &UserId) -> Result<Vec<ScheduleItem>>;
    async fn get_item_for_task(&self, owner: &UserId, task_id: &TaskId) -> Result<Option<ScheduleItem>>;
    async fn put_item(&self, item: ScheduleItem) -> Result<()>;
    async fn delete_item(&self, owner: &UserId, id: &ScheduleItemId) -> Result<()>;
    async fn delete_item_for_task(&self, owner: &UserId, task_id: &TaskId) -> Result<()>;
}

#[async_trait]
pub trait EnergyRepository: Send + Sync {
    async fn today_samples(&self, owner: &UserId, date: NaiveDate) -> Result<Vec<EnergySample>>;
    async fn all_samples(&self, owner: &UserId) -> Result<Vec<EnergySample>>;
    async fn put_sample(&self, sample: EnergySample) -> Result<()>;
    async fn patterns(&self, owner: &UserId) -> Result<Vec<HistoricalEnergyPattern>>;
    async fn put_patterns(&self, owner: &UserId, patterns: Vec<HistoricalEnergyPattern>) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<SchedulingProfile>>;
    async fn put_profile(&self, profile: SchedulingProfile) -> Result<()>;
}

/// In-memory implementation of all four ports, for the CLI's local mode
/// and for tests. Interior mutability via `tokio::sync::Mutex`, guarded
/// the same way the per-user lock registry guards mutation elsewhere.
#[derive(Default)]
pub struct InMemoryStore {
    tasks: Arc<Mutex<HashMap<UserId, HashMap<TaskId, Task>>>>,
    schedule: Arc<Mutex<HashMap<UserId, HashMap<ScheduleItemId, ScheduleItem>>>>,
    samples: Arc<Mutex<HashMap<UserId, Vec<EnergySample>>>>,
    patterns: Arc<Mutex<HashMap<UserId, Vec<HistoricalEnergyPattern>>>>,
    profiles: Arc<Mutex<HashMap<UserId, SchedulingProfile>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every table for a caller that wants to persist state
    /// across process restarts (the CLI's local JSON-file mode).
    pub async fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks.lock().await.clone(),
            schedule: self.schedule.lock().await.clone(),
            samples: self.samples.lock().await.clone(),
            patterns: self.patterns.lock().await.clone(),
            profiles: self.profiles.lock().await.clone(),
        }
    }

    /// Rebuild a store from a previously taken `StoreSnapshot`.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(snapshot.tasks)),
            schedule: Arc::new(Mutex::new(snapshot.schedule)),
            samples: Arc::new(Mutex::new(snapshot.samples)),
            patterns: Arc::new(Mutex::new(snapshot.patterns)),
            profiles: Arc::new(Mutex::new(snapshot.profiles)),
        }
    }
}

/// Plain, serializable mirror of `InMemoryStore`'s tables. A transport
/// layer with no real database (the CLI's local mode) round-trips this
/// to a JSON file between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tasks: HashMap<UserId, HashMap<TaskId, Task>>,
    #[serde(default)]
    pub schedule: HashMap<UserId, HashMap<ScheduleItemId, ScheduleItem>>,
    #[serde(default)]
    pub samples: HashMap<UserId, Vec<EnergySample>>,
    #[serde(default)]
    pub patterns: HashMap<UserId, Vec<HistoricalEnergyPattern>>,
    #[serde(default)]
    pub profiles: HashMap<UserId, SchedulingProfile>,
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn get_task(&self, owner: &UserId, id: &TaskId) -> Result<Option<Task>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks.get(owner).and_then(|m| m.get(id)).cloned())
    }

    async fn list_tasks(&self, owner: &UserId) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks.get(owner).map(|m| m.values().cloned().collect()).unwrap_or_default())
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        tasks.entry(task.owner.clone()).or_default().insert(task.id.clone(), task);
        Ok(())
    }

    async fn delete_task(&self, owner: &UserId, id: &TaskId) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        if let Some(m) = tasks.get_mut(owner) {
            m.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryStore {
    async fn list_items(&self, owner: &UserId) -> Result<Vec<ScheduleItem>> {
        let schedule = self.schedule.lock().await;
        Ok(schedule.get(owner).map(|m| m.values().cloned().collect()).unwrap_or_default())
    }

    async fn get_item_for_task(&self, owner: &UserId, task_id: &TaskId) -> Result<Option<ScheduleItem>> {
        let schedule = self.schedule.lock().await;
        Ok(schedule
            .get(owner)
            .and_then(|m| m.values().find(|item| item.task_id.as_ref() == Some(task_id)))
            .cloned())
    }

    async fn put_item(&self, item: ScheduleItem) -> Result<()> {
        let mut schedule = self.schedule.lock().await;
        schedule.entry(item.owner.clone()).or_default().insert(item.id.clone(), item);
        Ok(())
    }

    async fn delete_item(&self, owner: &UserId, id: &ScheduleItemId) -> Result<()> {
        let mut schedule = self.schedule.lock().await;
        if let Some(m) = schedule.get_mut(owner) {
            m.remove(id);
        }
        Ok(())
    }

    async fn delete_item_for_task(&self, owner: &UserId, task_id: &TaskId) -> Result<()> {
        let mut schedule = self.schedule.lock().await;
        if let Some(m) = schedule.get_mut(owner) {
            m.retain(|_, item| item.task_id.as_ref() != Some(task_id));
        }
        Ok(())
    }
}

#[async_trait]
impl EnergyRepository for InMemoryStore {
    async fn today_samples(&self, owner: &UserId, date: NaiveDate) -> Result<Vec<EnergySample>> {
        let samples = self.samples.lock().await;
        Ok(samples
            .get(owner)
            .map(|rows| rows.iter().filter(|s| s.date == date).cloned().collect())
            .unwrap_or_default())
    }

    async fn all_samples(&self, owner: &UserId) -> Result<Vec<EnergySample>> {
        let samples = self.samples.lock().await;
        Ok(samples.get(owner).cloned().unwrap_or_default())
    }

    async fn put_sample(&self, sample: EnergySample) -> Result<()> {
        let mut samples = self.samples.lock().await;
        let rows = samples.entry(sample.owner.clone()).or_default();
        if let Some(existing) = rows.iter_mut().find(|s| s.date == sample.date && s.hour == sample.hour) {
            *existing = sample;
        } else {
            rows.push(sample);
        }
        Ok(())
    }

    async fn patterns(&self, owner: &UserId) -> Result<Vec<HistoricalEnergyPattern>> {
        let patterns = self.patterns.lock().await;
        Ok(patterns.get(owner).cloned().unwrap_or_default())
    }

    async fn put_patterns(&self, owner: &UserId, patterns: Vec<HistoricalEnergyPattern>) -> Result<()> {
        let mut store = self.patterns.lock().await;
        store.insert(owner.clone(), patterns);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<SchedulingProfile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles.get(owner).cloned())
    }

    async fn put_profile(&self, profile: SchedulingProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.owner.clone(), profile);
        Ok(())
    }
}
