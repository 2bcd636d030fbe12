//! Decision Engine: recursive day-by-day search for the best slot,
//! bounded at a 6-day look-ahead.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, instrument};

use crate::classifier::determine_strategy;
use crate::constants::{event_buffer, MAX_LOOKAHEAD_DAYS};
use crate::context::build_context;
use crate::model::{EnergySample, HistoricalEnergyPattern, ScheduleItem, SleepSchedule, TaskId, TaskTag, UserId};
use crate::slots::{enumerate_candidates, filter_candidates, CandidateSlot, TaskFilterParams};

/// Everything the Engine needs that would otherwise require a persistence
/// round trip mid-recursion; fetched once per decision at the boundary.
pub struct EngineInputs<'a> {
    pub sleep: &'a SleepSchedule,
    pub tz: &'a chrono_tz::Tz,
    pub calendar: &'a [ScheduleItem],
    pub today_samples: &'a [EnergySample],
    pub historical_rows: &'a [HistoricalEnergyPattern],
}

/// The task-shaped parameters a single `find_optimal_slot` run needs.
pub struct TaskRequest {
    pub owner: UserId,
    pub tag: TaskTag,
    pub priority: i32,
    pub duration_minutes: i64,
    pub deadline: Option<DateTime<Utc>>,
}

/// Entry point: `findOptimalSlot(task, user, dayOffset, excludeTaskIds)`.
#[instrument(skip(inputs, request), fields(owner = %request.owner, tag = ?request.tag))]
pub fn find_optimal_slot(
    request: &TaskRequest,
    target_date: NaiveDate,
    day_offset: i64,
    exclude_task_ids: &[TaskId],
    now: DateTime<Utc>,
    inputs: &EngineInputs,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if day_offset > MAX_LOOKAHEAD_DAYS {
        debug!("look-ahead horizon exhausted");
        return None;
    }

    let strategy = determine_strategy(target_date, inputs.tz, now);
    let context = build_context(
        &request.owner,
        target_date,
        strategy,
        inputs.sleep,
        inputs.calendar,
        exclude_task_ids,
        inputs.today_samples,
        inputs.historical_rows,
        now,
    );

    let candidates = enumerate_candidates(&context, inputs.tz, request.duration_minutes);
    let deadline_is_today = request
        .deadline
        .map(|d| d.with_timezone(inputs.tz).date_naive() == now.with_timezone(inputs.tz).date_naive())
        .unwrap_or(false);
    let params = TaskFilterParams::new(
        request.duration_minutes,
        request.tag,
        request.priority,
        deadline_is_today,
        inputs.sleep,
        inputs.tz,
    );
    let survivors = filter_candidates(candidates, now, &context.calendar, event_buffer(), &params);

    if survivors.is_empty() {
        let next_day = target_date.succ_opt()?;
        if let Some(deadline) = request.deadline {
            let deadline_date = deadline.with_timezone(inputs.tz).date_naive();
            if next_day >= deadline_date {
                return None;
            }
        }
        return find_optimal_slot(request, next_day, day_offset + 1, exclude_task_ids, now, inputs);
    }

    let best = rank_and_select(survivors)?;
    Some((best.start_time, best.start_time + Duration::minutes(request.duration_minutes)))
}

/// Descending energy, ties within 0.1 broken by earliest start.
fn rank_and_select(mut slots: Vec<CandidateSlot>) -> Option<CandidateSlot> {
    slots.sort_by(|a, b| {
        let energy_order = b.energy_level.partial_cmp(&a.energy_level).unwrap_or(std::cmp::Ordering::Equal);
        if energy_order != std::cmp::Ordering::Equal && (a.energy_level - b.energy_level).abs() >= 0.1 {
            return energy_order;
        }
        a.start_time.cmp(&b.start_time)
    });
    slots.into_iter().next()
}
