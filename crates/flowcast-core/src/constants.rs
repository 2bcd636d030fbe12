//! Fixed constants and per-tag energy windows for the scheduling core.

use chrono::Duration;

use crate::model::TaskTag;

/// Buffer added on each side of a calendar *event* (not task) interval
/// before checking for conflicts.
pub const EVENT_BUFFER_MINUTES: i64 = 10;

/// A candidate slot must start at least this far in the future.
pub const NOT_IN_PAST_GUARD_MINUTES: i64 = 15;

/// Cognitive-load buffer reserved between back-to-back deep/creative work,
/// exposed for callers that want to pad adjacent placements; the pipeline
/// itself enforces it implicitly through the calendar-conflict check once a
/// task is persisted as a `ScheduleItem`.
pub const COGNITIVE_LOAD_BUFFER_MINUTES: i64 = 30;

/// Maximum number of calendar days the Decision Engine will look ahead.
pub const MAX_LOOKAHEAD_DAYS: i64 = 6;

/// Default scheduling window in days when no deadline constrains it.
pub const DEFAULT_SCHEDULING_WINDOW_DAYS: i64 = 7;

/// Width, in hours, of the "late wind-down" window preceding bedtime.
pub const LATE_WIND_DOWN_HOURS: i64 = 2;

/// A placement whose deadline falls within this many hours of its
/// scheduled end triggers a `task_deadline_approaching` notification.
pub const DEADLINE_APPROACHING_HOURS: f64 = 24.0;

/// Required energy band `[min, max]` for a task tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBand {
    pub min: f64,
    pub max: f64,
}

impl EnergyBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, level: f64) -> bool {
        level >= self.min && level <= self.max
    }
}

/// Required energy band per task tag, per spec §4.3.
pub fn energy_band_for(tag: TaskTag) -> EnergyBand {
    match tag {
        TaskTag::Deep => EnergyBand::new(0.7, 1.0),
        TaskTag::Creative => EnergyBand::new(0.4, 1.0),
        TaskTag::Admin => EnergyBand::new(0.3, 0.7),
        TaskTag::Personal => EnergyBand::new(0.1, 0.7),
    }
}

/// Fallback band used when no tag applies (kept distinct from any single
/// tag's band so callers can tell "default" from "personal").
pub const DEFAULT_ENERGY_BAND: EnergyBand = EnergyBand::new(0.3, 1.0);

pub fn event_buffer() -> Duration {
    Duration::minutes(EVENT_BUFFER_MINUTES)
}

pub fn not_in_past_guard() -> Duration {
    Duration::minutes(NOT_IN_PAST_GUARD_MINUTES)
}
