//! Historical energy provider: per-hour running averages across all
//! recorded samples, gaps filled from the sleep-derived generator with
//! `sample_count = 0` so callers can tell an estimate from real history.

use chrono::Utc;

use crate::model::{EnergySample, HistoricalEnergyPattern, SleepSchedule, UserId};

use super::generator::generate_hour;
use super::{EnergyReading, EnergyTable};

/// Build the full 24-hour historical table for a user, filling any hour
/// with no recorded pattern from the sleep-derived curve.
pub fn historical_patterns(
    patterns: &[HistoricalEnergyPattern],
    owner: &UserId,
    sleep: &SleepSchedule,
) -> EnergyTable {
    let mut readings = Vec::with_capacity(24);
    for hour in 0..24u32 {
        let pattern = patterns.iter().find(|p| &p.owner == owner && p.hour == hour);
        let reading = match pattern {
            Some(p) if p.sample_count > 0 => EnergyReading {
                hour,
                energy_level: p.average_energy,
                stage: generate_hour(sleep, hour).stage,
                is_historical: true,
            },
            _ => {
                let generated = generate_hour(sleep, hour);
                EnergyReading {
                    hour,
                    energy_level: generated.energy_level,
                    stage: generated.stage,
                    is_historical: false,
                }
            }
        };
        readings.push(reading);
    }
    EnergyTable::new(readings)
}

/// Recompute a user's full 24-hour historical pattern table from every
/// `EnergySample` row they've ever recorded. Each hour's mean and count
/// are derived from scratch rather than folded incrementally, so
/// correcting an already-logged hour (an upsert in the repository) is
/// reflected exactly once, not folded on top of its own prior value.
/// Hours with no samples get a synthesized `sample_count = 0` row seeded
/// from the existing table, if any, so `last_updated` isn't lost.
pub fn update_historical_patterns(
    all_samples: &[EnergySample],
    owner: &UserId,
    existing: &[HistoricalEnergyPattern],
) -> Vec<HistoricalEnergyPattern> {
    let mut out = Vec::with_capacity(24);
    for hour in 0..24u32 {
        let mut sum = 0.0;
        let mut count = 0u64;
        let mut last_updated = None;
        for sample in all_samples.iter().filter(|s| &s.owner == owner && s.hour == hour) {
            sum += sample.energy_level;
            count += 1;
            last_updated = Some(last_updated.map_or(sample.recorded_at, |prev| prev.max(sample.recorded_at)));
        }
        if count > 0 {
            out.push(HistoricalEnergyPattern {
                owner: owner.clone(),
                hour,
                average_energy: sum / count as f64,
                sample_count: count,
                last_updated: last_updated.unwrap(),
            });
        } else {
            let carried_last_updated = existing
                .iter()
                .find(|p| &p.owner == owner && p.hour == hour)
                .map(|p| p.last_updated)
                .unwrap_or_else(Utc::now);
            out.push(HistoricalEnergyPattern {
                owner: owner.clone(),
                hour,
                average_energy: 0.0,
                sample_count: 0,
                last_updated: carried_last_updated,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chronotype, EnergyStage};
    use chrono::NaiveDate;

    fn sleep() -> SleepSchedule {
        SleepSchedule {
            bedtime: 23,
            wake_hour: 7,
            chronotype: Chronotype::Neutral,
        }
    }

    #[test]
    fn hour_with_no_pattern_falls_back_to_generated_estimate() {
        let owner = UserId::from("u1");
        let table = historical_patterns(&[], &owner, &sleep());
        let reading = table.readings().iter().find(|r| r.hour == 11).unwrap();
        assert!(!reading.is_historical);
        let generated = generate_hour(&sleep(), 11);
        assert!((reading.energy_level - generated.energy_level).abs() < 1e-9);
    }

    fn sample_at(owner: &UserId, hour: u32, level: f64) -> EnergySample {
        EnergySample {
            owner: owner.clone(),
            date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            hour,
            energy_level: level,
            stage: EnergyStage::AfternoonRebound,
            mood_label: None,
            has_manual_check_in: true,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn update_produces_all_24_hours() {
        let owner = UserId::from("u1");
        let samples = vec![sample_at(&owner, 14, 0.6)];
        let patterns = update_historical_patterns(&samples, &owner, &[]);
        assert_eq!(patterns.len(), 24);
        let hour14 = patterns.iter().find(|p| p.hour == 14).unwrap();
        assert_eq!(hour14.sample_count, 1);
        assert!((hour14.average_energy - 0.6).abs() < 1e-9);
        let hour3 = patterns.iter().find(|p| p.hour == 3).unwrap();
        assert_eq!(hour3.sample_count, 0);
    }

    #[test]
    fn update_averages_multiple_samples_for_the_same_hour() {
        let owner = UserId::from("u1");
        let samples = vec![sample_at(&owner, 14, 0.8), sample_at(&owner, 14, 0.4)];
        let patterns = update_historical_patterns(&samples, &owner, &[]);
        let hour14 = patterns.iter().find(|p| p.hour == 14).unwrap();
        assert_eq!(hour14.sample_count, 2);
        assert!((hour14.average_energy - 0.6).abs() < 1e-9);
    }

    #[test]
    fn correcting_a_sample_does_not_double_count_it() {
        // put_sample upserts by (owner, date, hour), so all_samples only ever
        // contains the latest value for a given hour -- recomputing from
        // scratch must reflect just that one corrected reading.
        let owner = UserId::from("u1");
        let samples = vec![sample_at(&owner, 14, 0.4)];
        let patterns = update_historical_patterns(&samples, &owner, &[]);
        let hour14 = patterns.iter().find(|p| p.hour == 14).unwrap();
        assert_eq!(hour14.sample_count, 1);
        assert!((hour14.average_energy - 0.4).abs() < 1e-9);
    }

    #[test]
    fn hours_with_no_samples_carry_forward_existing_last_updated() {
        let owner = UserId::from("u1");
        let stamp = Utc::now();
        let existing = vec![HistoricalEnergyPattern {
            owner: owner.clone(),
            hour: 3,
            average_energy: 0.0,
            sample_count: 0,
            last_updated: stamp,
        }];
        let patterns = update_historical_patterns(&[], &owner, &existing);
        let hour3 = patterns.iter().find(|p| p.hour == 3).unwrap();
        assert_eq!(hour3.sample_count, 0);
        assert_eq!(hour3.last_updated, stamp);
    }
}
