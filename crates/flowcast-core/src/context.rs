//! SchedulingContext assembly: calendar snapshot + the right energy
//! provider for the chosen strategy, for one Decision Engine run.

use chrono::{DateTime, NaiveDate, Utc};

use crate::classifier::SchedulingStrategy;
use crate::energy::{historical_patterns, today_forecast, EnergyProvider, EnergyReading, EnergyTable};
use crate::model::{EnergySample, HistoricalEnergyPattern, ScheduleItem, SleepSchedule, UserId};

/// Snapshot assembled once per Decision Engine day-step: the calendar
/// items in play and the energy readings for the target date's strategy.
pub struct SchedulingContext {
    pub target_date: NaiveDate,
    pub strategy: SchedulingStrategy,
    pub calendar: Vec<ScheduleItem>,
    pub energy: EnergyTable,
}

impl SchedulingContext {
    pub fn energy_at(&self, hour: u32) -> Option<EnergyReading> {
        self.energy.energy_at(hour)
    }
}

/// Build a context for one day-step of the Decision Engine, excluding
/// `excluded_task_ids` from the calendar snapshot (the cascade's
/// self-conflict avoidance).
pub fn build_context(
    owner: &UserId,
    target_date: NaiveDate,
    strategy: SchedulingStrategy,
    sleep: &SleepSchedule,
    calendar_snapshot: &[ScheduleItem],
    excluded_task_ids: &[crate::model::TaskId],
    today_samples: &[EnergySample],
    historical_rows: &[HistoricalEnergyPattern],
    now: DateTime<Utc>,
) -> SchedulingContext {
    let calendar = calendar_snapshot
        .iter()
        .filter(|item| match &item.task_id {
            Some(task_id) => !excluded_task_ids.contains(task_id),
            None => true,
        })
        .cloned()
        .collect();

    let energy = match strategy {
        SchedulingStrategy::Today => today_forecast(today_samples, owner, now.date_naive(), sleep),
        SchedulingStrategy::Future => historical_patterns(historical_rows, owner, sleep),
    };

    SchedulingContext {
        target_date,
        strategy,
        calendar,
        energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chronotype, ScheduleItemId, ScheduleItemType, TaskId};

    fn sleep() -> SleepSchedule {
        SleepSchedule {
            bedtime: 23,
            wake_hour: 7,
            chronotype: Chronotype::Neutral,
        }
    }

    #[test]
    fn excluded_task_ids_are_removed_from_calendar_snapshot() {
        let owner = UserId::from("u1");
        let excluded = TaskId::from("t1");
        let item = ScheduleItem {
            id: ScheduleItemId::from("s1"),
            owner: owner.clone(),
            title: "x".into(),
            start_time: "2026-07-28T10:00:00Z".parse().unwrap(),
            end_time: "2026-07-28T11:00:00Z".parse().unwrap(),
            item_type: ScheduleItemType::Task,
            task_id: Some(excluded.clone()),
        };
        let now = Utc::now();
        let ctx = build_context(
            &owner,
            now.date_naive(),
            SchedulingStrategy::Today,
            &sleep(),
            &[item],
            &[excluded],
            &[],
            &[],
            now,
        );
        assert!(ctx.calendar.is_empty());
    }

    #[test]
    fn non_excluded_items_survive() {
        let owner = UserId::from("u1");
        let item = ScheduleItem {
            id: ScheduleItemId::from("s1"),
            owner: owner.clone(),
            title: "x".into(),
            start_time: "2026-07-28T10:00:00Z".parse().unwrap(),
            end_time: "2026-07-28T11:00:00Z".parse().unwrap(),
            item_type: ScheduleItemType::Event,
            task_id: None,
        };
        let now = Utc::now();
        let ctx = build_context(
            &owner,
            now.date_naive(),
            SchedulingStrategy::Today,
            &sleep(),
            &[item],
            &[],
            &[],
            &[],
            now,
        );
        assert_eq!(ctx.calendar.len(), 1);
    }
}
