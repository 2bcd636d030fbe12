//! Today-recorded energy provider: readings from `EnergySample` rows
//! logged for the current calendar day. No fallback -- an hour with no
//! check-in simply has no reading, so the Today strategy only ever
//! proposes hours the user actually logged.

use chrono::NaiveDate;

use crate::model::{EnergySample, SleepSchedule, UserId};

use super::{EnergyReading, EnergyTable};

/// Build today's hourly table from recorded `EnergySample` rows only,
/// hour-sorted. `sleep` is accepted for symmetry with the other
/// providers but unused -- today's forecast never falls back to the
/// generated curve.
pub fn today_forecast(
    samples: &[EnergySample],
    owner: &UserId,
    date: NaiveDate,
    _sleep: &SleepSchedule,
) -> EnergyTable {
    let mut readings: Vec<EnergyReading> = samples
        .iter()
        .filter(|s| &s.owner == owner && s.date == date)
        .map(|s| EnergyReading {
            hour: s.hour,
            energy_level: s.energy_level,
            stage: s.stage,
            is_historical: false,
        })
        .collect();
    readings.sort_by_key(|r| r.hour);
    EnergyTable::new(readings)
}
