//! End-to-end scenarios and quantified invariants for the smart-scheduling
//! core, run entirely through `FlowCastCore`'s public API against an
//! `InMemoryStore` -- no mocked engine internals.
//!
//! Every scenario pins a `SchedulingProfile` of UTC / bedtime 23 / wake 7 /
//! neutral chronotype, so the sleep-derived energy curve is identical
//! across tests: the only hours reaching the "deep" energy band
//! `[0.7, 1.0]` are 10:00, 11:00, 12:00 (all within the 0.1 near-tie
//! window the Engine breaks by earliest start), and 21:00-22:00 are the
//! late-wind-down hours preceding bedtime.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;

use flowcast_core::energy::generator::generate_hour;
use flowcast_core::{
    Chronotype, CoreError, EnergySample, FlowCastCore, HistoricalEnergyPattern, InMemoryStore,
    NewTaskSpec, NotificationType, ScheduleItem, ScheduleItemId, ScheduleItemType,
    SchedulingError, SchedulingProfile, SleepSchedule, TaskTag, UserId,
};

fn core() -> FlowCastCore<InMemoryStore> {
    FlowCastCore::new(Arc::new(InMemoryStore::new()))
}

fn neutral_sleep() -> SleepSchedule {
    SleepSchedule {
        bedtime: 23,
        wake_hour: 7,
        chronotype: Chronotype::Neutral,
    }
}

async fn seed_profile(core: &FlowCastCore<InMemoryStore>, owner: &UserId) {
    core.put_profile(SchedulingProfile {
        owner: owner.clone(),
        timezone: chrono_tz::UTC,
        sleep_schedule: neutral_sleep(),
    })
    .await
    .unwrap();
}

/// `today_forecast` has no generator fallback -- it only ever reports
/// hours the caller actually logged a check-in for. These scenarios test
/// same-day placement against the sleep-derived curve, so seed one
/// recorded sample per hour of `date` with exactly the values that curve
/// would produce, as if the user had checked in all day.
async fn seed_today_curve(core: &FlowCastCore<InMemoryStore>, owner: &UserId, date: NaiveDate) {
    let sleep = neutral_sleep();
    for hour in 0..24u32 {
        let generated = generate_hour(&sleep, hour);
        core.record_energy_sample(
            owner,
            EnergySample {
                owner: owner.clone(),
                date,
                hour,
                energy_level: generated.energy_level,
                stage: generated.stage,
                mood_label: None,
                has_manual_check_in: false,
                recorded_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().expect("valid RFC3339 instant")
}

fn deep_task(title: &str, priority: i32, start_time: Option<DateTime<Utc>>, end_time: Option<DateTime<Utc>>) -> NewTaskSpec {
    NewTaskSpec {
        title: title.into(),
        description: None,
        estimated_duration_minutes: 60,
        priority,
        tag: TaskTag::Deep,
        auto_schedule: true,
        start_time,
        end_time,
    }
}

async fn blackout(core: &FlowCastCore<InMemoryStore>, owner: &UserId, id: &str, start: &str, end: &str, now: DateTime<Utc>) {
    core.on_new_event(
        owner,
        ScheduleItem {
            id: ScheduleItemId::from(id),
            owner: owner.clone(),
            title: "Blackout".into(),
            start_time: at(start),
            end_time: at(end),
            item_type: ScheduleItemType::Event,
            task_id: None,
        },
        now,
    )
    .await
    .unwrap();
}

// --- S1: same-day optimal placement -----------------------------------

#[tokio::test]
async fn s1_same_day_optimal_placement() {
    let core = core();
    let owner = UserId::from("u-s1");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let spec = deep_task("Draft architecture doc", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, notifications) = core.create_task(&owner, spec, now).await.unwrap();

    let start = task.scheduled_start().expect("task should be placed");
    assert_eq!(start, at("2026-07-28T10:00:00Z"));
    assert!(notifications.is_empty());
}

// --- S2: event buffer forces rollover to the next day -------------------

#[tokio::test]
async fn s2_event_buffer_forces_rollover_to_next_day() {
    let core = core();
    let owner = UserId::from("u-s2");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    // Raw interval ends at 11:55, short of noon -- only the 10-minute
    // event buffer widens it past 12:00 and knocks out the third deep-work
    // hour. Without the buffer, 12:00-13:00 would still be free today.
    blackout(&core, &owner, "client-call", "2026-07-28T09:51:00Z", "2026-07-28T11:55:00Z", now).await;

    let spec = deep_task("Spec the ingestion pipeline", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _notifications) = core.create_task(&owner, spec, now).await.unwrap();

    let start = task.scheduled_start().expect("task should be placed");
    assert_eq!(start, at("2026-07-29T10:00:00Z"), "all three deep-work hours today are blocked once the buffer is applied");
}

// --- S3: a higher-priority deep task displaces a lower-priority one -----

#[tokio::test]
async fn s3_deep_work_displacement() {
    let core = core();
    let owner = UserId::from("u-s3");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let low_spec = deep_task("Refactor the importer", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (low_task, _) = core.create_task(&owner, low_spec, now).await.unwrap();
    assert_eq!(low_task.scheduled_start().unwrap(), at("2026-07-28T10:00:00Z"));

    let high_spec = deep_task("Fix the production incident writeup", 5, Some(at("2026-07-28T00:00:00Z")), None);
    let (high_task, notifications) = core.create_task(&owner, high_spec, now + Duration::minutes(5)).await.unwrap();

    assert_eq!(high_task.scheduled_start().unwrap(), at("2026-07-28T10:00:00Z"), "the priority-5 task takes the best slot outright");

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::TaskRescheduled);
    assert_eq!(notifications[0].task_id.as_ref(), Some(&low_task.id));

    let displaced = core.get_task(&owner, &low_task.id).await.unwrap().expect("task still exists");
    assert_eq!(displaced.scheduled_start().unwrap(), at("2026-07-28T11:00:00Z"), "bumped to the next best deep-work hour");

    let mirror = core.list_schedule(&owner).await.unwrap();
    let high_item = mirror.iter().find(|i| i.task_id.as_ref() == Some(&high_task.id)).expect("incoming task has a mirror item");
    assert_eq!(high_item.start_time, at("2026-07-28T10:00:00Z"));
    let low_item = mirror.iter().find(|i| i.task_id.as_ref() == Some(&low_task.id)).expect("displaced task has a mirror item");
    assert_eq!(low_item.start_time, at("2026-07-28T11:00:00Z"));
}

// --- S4: no slot anywhere in the look-ahead horizon -> clean refusal ----

#[tokio::test]
async fn s4_no_slot_refusal() {
    let core = core();
    let owner = UserId::from("u-s4");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");

    // One event spanning three weeks blocks every hour of every day the
    // 6-day look-ahead could ever reach.
    blackout(&core, &owner, "everything", "2026-07-21T00:00:00Z", "2026-08-18T00:00:00Z", now).await;

    let spec = deep_task("Unplaceable deep work", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let err = core.create_task(&owner, spec, now).await.unwrap_err();

    assert!(matches!(err, CoreError::Scheduling(SchedulingError::NoOptimalTime { .. })));
    assert!(core.list_tasks(&owner).await.unwrap().is_empty(), "a refused task must never be persisted");
}

// --- S5: late-wind-down concession for an urgent personal task ----------

#[tokio::test]
async fn s5_late_wind_down_concession() {
    let core = core();
    let owner = UserId::from("u-s5");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T02:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    // Blocks every awake hour up to (but not including) the late-wind-down
    // window, leaving 21:00-22:59 as the only candidates.
    blackout(&core, &owner, "daytime-blackout", "2026-07-28T00:00:00Z", "2026-07-28T20:45:00Z", now).await;

    let spec = NewTaskSpec {
        title: "Call mom back".into(),
        description: None,
        estimated_duration_minutes: 60,
        priority: 5,
        tag: TaskTag::Personal,
        auto_schedule: true,
        start_time: None,
        end_time: Some(at("2026-07-28T23:00:00Z")),
    };
    let (task, _notifications) = core.create_task(&owner, spec, now).await.unwrap();

    let start = task.scheduled_start().expect("task should be placed");
    assert_eq!(start, at("2026-07-28T21:00:00Z"));
}

// --- S6: cancelling an event rebalances the task it had displaced -------

#[tokio::test]
async fn s6_event_cancellation_rebalance() {
    let core = core();
    let owner = UserId::from("u-s6");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let blocker_id = ScheduleItemId::from("s6-offsite");
    blackout(&core, &owner, "s6-offsite", "2026-07-28T10:00:00Z", "2026-07-28T13:00:00Z", now).await;

    let spec = deep_task("Prepare quarterly review", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();
    let pushed_out_start = task.scheduled_start().expect("task should be placed");
    assert_eq!(pushed_out_start.date_naive(), NaiveDate::from_ymd_opt(2026, 7, 29).unwrap());

    let notifications = core.remove_event(&owner, &blocker_id, now).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::TaskRescheduled);

    let moved = core.get_task(&owner, &task.id).await.unwrap().expect("task still exists");
    let new_start = moved.scheduled_start().expect("task still placed");
    assert_eq!(new_start, at("2026-07-28T10:00:00Z"));

    let mirror = core.list_schedule(&owner).await.unwrap();
    let item = mirror.iter().find(|i| i.task_id.as_ref() == Some(&task.id)).expect("mirror item exists");
    assert_eq!(item.start_time, new_start);
}

// --- Quantified invariants (spec.md section 8) --------------------------

#[tokio::test]
async fn invariant_1_no_past_placement() {
    let core = core();
    let owner = UserId::from("u-inv1");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let spec = deep_task("Plan the sprint", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();

    let start = task.scheduled_start().expect("task should be placed");
    assert!(start >= now + Duration::minutes(15));
}

#[tokio::test]
async fn invariant_2_energy_within_tag_band() {
    let core = core();
    let owner = UserId::from("u-inv2");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let spec = deep_task("Review the RFC", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();
    let start = task.scheduled_start().unwrap();

    use chrono::Timelike;
    let hour = start.hour();
    let sleep = neutral_sleep();
    let reading = generate_hour(&sleep, hour);
    let band = flowcast_core::constants::energy_band_for(TaskTag::Deep);
    assert!(band.contains(reading.energy_level), "chosen slot's energy {} must fall in [{}, {}]", reading.energy_level, band.min, band.max);
}

#[tokio::test]
async fn invariant_3_no_calendar_overlap() {
    let core = core();
    let owner = UserId::from("u-inv3");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    blackout(&core, &owner, "inv3-meeting", "2026-07-28T10:00:00Z", "2026-07-28T11:00:00Z", now).await;

    let spec = deep_task("Deep work block", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();
    let start = task.scheduled_start().unwrap();
    let end = task.scheduled_end().unwrap();

    let buffer = Duration::minutes(flowcast_core::constants::EVENT_BUFFER_MINUTES);
    assert!(!(at("2026-07-28T10:00:00Z") - buffer < end && at("2026-07-28T11:00:00Z") + buffer > start), "must not overlap the buffered event");
}

#[tokio::test]
async fn invariant_4_sleep_exclusion() {
    let core = core();
    let owner = UserId::from("u-inv4");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T02:00:00Z");
    seed_today_curve(&core, &owner, now.date_naive()).await;

    let spec = deep_task("Deep work block", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();
    let start = task.scheduled_start().unwrap();

    use chrono::Timelike;
    let sleep = neutral_sleep();
    assert!(!sleep.is_sleep_hour(start.hour()));
}

#[tokio::test]
async fn invariant_5_duration_correctness() {
    let core = core();
    let owner = UserId::from("u-inv5");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T02:00:00Z");

    // A deadline far later than the chosen slot must not leak into the
    // placed duration: the task's own `estimated_duration_minutes` wins.
    let spec = NewTaskSpec {
        title: "Write onboarding guide".into(),
        description: None,
        estimated_duration_minutes: 45,
        priority: 3,
        tag: TaskTag::Admin,
        auto_schedule: true,
        start_time: None,
        end_time: Some(at("2026-07-30T18:00:00Z")),
    };
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();
    let start = task.scheduled_start().unwrap();
    let end = task.scheduled_end().unwrap();
    assert_eq!(end - start, Duration::minutes(45));
}

#[tokio::test]
async fn invariant_6_mirror_consistency() {
    let core = core();
    let owner = UserId::from("u-inv6");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");

    let spec = deep_task("Deep work block", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let (task, _) = core.create_task(&owner, spec, now).await.unwrap();

    let mirror = core.list_schedule(&owner).await.unwrap();
    let matches: Vec<_> = mirror
        .iter()
        .filter(|i| i.item_type == ScheduleItemType::Task && i.task_id.as_ref() == Some(&task.id))
        .collect();
    assert_eq!(matches.len(), 1, "exactly one mirror item must back the placed task");
    assert_eq!(matches[0].start_time, task.scheduled_start().unwrap());
    assert_eq!(matches[0].end_time, task.scheduled_end().unwrap());
}

#[test]
fn invariant_7_pattern_builder_is_idempotent_without_new_samples() {
    let owner = UserId::from("u-inv7");
    let sleep = SleepSchedule {
        bedtime: 23,
        wake_hour: 7,
        chronotype: Chronotype::Neutral,
    };
    let patterns = vec![HistoricalEnergyPattern {
        owner: owner.clone(),
        hour: 9,
        average_energy: 0.62,
        sample_count: 3,
        last_updated: Utc::now(),
    }];

    let first = flowcast_core::energy::historical_patterns(&patterns, &owner, &sleep);
    let second = flowcast_core::energy::historical_patterns(&patterns, &owner, &sleep);

    assert_eq!(first.readings().len(), 24);
    assert_eq!(second.readings().len(), 24);
    for (a, b) in first.readings().iter().zip(second.readings().iter()) {
        assert_eq!(a.hour, b.hour);
        assert!((a.energy_level - b.energy_level).abs() < 1e-12);
        assert_eq!(a.is_historical, b.is_historical);
    }
}

#[test]
fn invariant_8_displacement_asymmetry() {
    let now = Utc::now();
    // Strictly lower priority: always displaced.
    assert!(flowcast_core::cascade::displaces(4, now, 2, now));
    // Equal priority, displacer's placement ends earlier: displaced.
    assert!(flowcast_core::cascade::displaces(3, now, 3, now + Duration::hours(1)));
    // Equal priority, displacer's placement ends later: never displaced.
    assert!(!flowcast_core::cascade::displaces(3, now + Duration::hours(1), 3, now));
    // Strictly higher priority existing task: never displaced.
    assert!(!flowcast_core::cascade::displaces(2, now, 4, now));
}

#[test]
fn invariant_9_look_ahead_bound_is_seven_calendar_days() {
    // day_offset runs 0..=MAX_LOOKAHEAD_DAYS inclusive before the Engine
    // gives up, i.e. exactly seven distinct calendar days.
    assert_eq!(flowcast_core::constants::MAX_LOOKAHEAD_DAYS, 6);
}

#[tokio::test]
async fn invariant_10_refusal_atomicity() {
    let core = core();
    let owner = UserId::from("u-inv10");
    seed_profile(&core, &owner).await;
    let now = at("2026-07-28T06:00:00Z");

    blackout(&core, &owner, "everything", "2026-07-21T00:00:00Z", "2026-08-18T00:00:00Z", now).await;

    let spec = deep_task("Unplaceable deep work", 3, Some(at("2026-07-28T00:00:00Z")), None);
    let err = core.create_task(&owner, spec, now).await.unwrap_err();
    assert!(matches!(err, CoreError::Scheduling(SchedulingError::NoOptimalTime { .. })));

    assert!(core.list_tasks(&owner).await.unwrap().is_empty());
    let mirror_tasks: Vec<_> = core
        .list_schedule(&owner)
        .await
        .unwrap()
        .into_iter()
        .filter(|i| i.item_type == ScheduleItemType::Task)
        .collect();
    assert!(mirror_tasks.is_empty(), "no stray mirror item may survive a refused placement");
}
