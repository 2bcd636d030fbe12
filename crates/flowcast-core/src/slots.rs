//! Slot Generator & Filter Pipeline: turns a `SchedulingContext` into
//! ranked, conflict-free candidate placements for one task.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::constants::{energy_band_for, not_in_past_guard, EnergyBand};
use crate::context::SchedulingContext;
use crate::model::{EnergyStage, ScheduleItem, SleepSchedule, TaskTag};

/// One enumerated hour-slot, before or after filtering.
#[derive(Debug, Clone)]
pub struct CandidateSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub energy_level: f64,
    pub stage: EnergyStage,
    pub is_historical: bool,
    pub is_today: bool,
    pub has_conflict: bool,
}

/// Per-task parameters the filter pipeline's late-wind-down concession
/// needs (spec §4.3 step 6).
pub struct TaskFilterParams<'a> {
    pub duration_minutes: i64,
    pub energy_band: EnergyBand,
    pub tag: TaskTag,
    pub priority: i32,
    pub deadline_is_today: bool,
    pub sleep: &'a SleepSchedule,
    pub tz: &'a chrono_tz::Tz,
}

impl<'a> TaskFilterParams<'a> {
    pub fn new(
        duration_minutes: i64,
        tag: TaskTag,
        priority: i32,
        deadline_is_today: bool,
        sleep: &'a SleepSchedule,
        tz: &'a chrono_tz::Tz,
    ) -> Self {
        Self {
            duration_minutes,
            energy_band: energy_band_for(tag),
            tag,
            priority,
            deadline_is_today,
            sleep,
            tz,
        }
    }
}

/// Step 1: one 1-hour candidate per surviving energy reading on
/// `context.target_date`, at that hour in `tz`.
pub fn enumerate_candidates(context: &SchedulingContext, tz: &chrono_tz::Tz, duration_minutes: i64) -> Vec<CandidateSlot> {
    let mut out = Vec::with_capacity(24);
    for hour in 0..24u32 {
        let Some(reading) = context.energy_at(hour) else {
            continue;
        };
        let Some(start) = local_hour_to_utc(context.target_date, hour, tz) else {
            continue;
        };
        let end = start + Duration::minutes(duration_minutes);
        out.push(CandidateSlot {
            start_time: start,
            end_time: end,
            energy_level: reading.energy_level,
            stage: reading.stage,
            is_historical: reading.is_historical,
            is_today: matches!(context.strategy, crate::classifier::SchedulingStrategy::Today),
            has_conflict: false,
        });
    }
    out
}

fn local_hour_to_utc(date: NaiveDate, hour: u32, tz: &chrono_tz::Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    let local = tz.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Run the full six-stage pipeline, returning only surviving slots.
pub fn filter_candidates(
    candidates: Vec<CandidateSlot>,
    now: DateTime<Utc>,
    calendar: &[ScheduleItem],
    event_buffer: Duration,
    params: &TaskFilterParams,
) -> Vec<CandidateSlot> {
    candidates
        .into_iter()
        .filter(|slot| past_cut(slot, now))
        .filter(|slot| energy_filter(slot, params.energy_band))
        .filter(|slot| !has_calendar_conflict(slot, calendar, event_buffer))
        .filter(|slot| !sleep_hours_cut(slot, params.sleep, params.tz))
        .filter(|slot| !late_wind_down_cut(slot, params))
        .collect()
}

fn past_cut(slot: &CandidateSlot, now: DateTime<Utc>) -> bool {
    slot.start_time >= now + not_in_past_guard()
}

fn energy_filter(slot: &CandidateSlot, band: EnergyBand) -> bool {
    band.contains(slot.energy_level)
}

fn has_calendar_conflict(slot: &CandidateSlot, calendar: &[ScheduleItem], event_buffer: Duration) -> bool {
    calendar
        .iter()
        .any(|item| item.conflicts_with(slot.start_time, slot.end_time, event_buffer))
}

fn sleep_hours_cut(slot: &CandidateSlot, sleep: &SleepSchedule, tz: &chrono_tz::Tz) -> bool {
    let local_hour = local_hour_of(slot.start_time, tz);
    sleep.is_sleep_hour(local_hour)
}

/// Drop unless all three hold: personal tag, priority 5, deadline today.
fn late_wind_down_cut(slot: &CandidateSlot, params: &TaskFilterParams) -> bool {
    let local_hour = local_hour_of(slot.start_time, params.tz);
    if !params.sleep.is_late_wind_down_hour(local_hour) {
        return false;
    }
    let concession = params.tag == TaskTag::Personal && params.priority == 5 && params.deadline_is_today;
    !concession
}

fn local_hour_of(at: DateTime<Utc>, tz: &chrono_tz::Tz) -> u32 {
    use chrono::Timelike;
    at.with_timezone(tz).hour()
}
