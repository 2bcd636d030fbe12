//! # FlowCast Core Library
//!
//! Core business logic for FlowCast, an energy-aware task scheduler. All
//! operations are available via a standalone CLI binary; there is no
//! GUI layer in this workspace.
//!
//! ## Architecture
//!
//! - **Energy Substrate**: today-recorded, historical-average, and
//!   sleep-derived-fallback providers of per-hour energy
//! - **Decision Engine**: recursive day-by-day search for the best slot
//!   matching a task's required energy band
//! - **Cascade**: bounded, single-layer displacement of lower-priority
//!   tasks to make room for higher-priority ones
//! - **Repository**: persistence ports (traits), with an in-memory
//!   implementation for the CLI and tests
//!
//! ## Key Components
//!
//! - [`model::Task`]: the schedulable unit
//! - [`error::CoreError`]: the error type returned by every entry point

pub mod api;
pub mod cascade;
pub mod classifier;
pub mod constants;
pub mod context;
pub mod energy;
pub mod engine;
pub mod error;
pub mod locking;
pub mod model;
pub mod notifications;
pub mod repository;
pub mod slots;

pub use api::{FlowCastCore, NewTaskSpec, Store};
pub use classifier::{PatchedStartTime, SchedulingStrategy, TaskPatch};
pub use error::{CoreError, RepositoryError, SchedulingError, ValidationError};
pub use locking::LockRegistry;
pub use model::{
    Chronotype, EnergySample, EnergyStage, HistoricalEnergyPattern, ScheduleItem,
    ScheduleItemId, ScheduleItemType, SchedulingProfile, SleepSchedule, Task, TaskId,
    TaskMoment, TaskStatus, TaskTag, UserId,
};
pub use energy::{EnergyProvider, EnergyReading, EnergyTable};
pub use notifications::{Notification, NotificationType, Severity};
pub use repository::{
    EnergyRepository, InMemoryStore, ScheduleRepository, StoreSnapshot, TaskRepository,
    UserRepository,
};
