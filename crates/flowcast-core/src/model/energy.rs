//! Energy sample and historical pattern types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Human-readable region of the daily energy curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyStage {
    MorningRise,
    MorningPeak,
    MiddayDip,
    AfternoonRebound,
    WindDown,
    SleepPhase,
}

/// A single recorded (or seeded) hourly energy reading.
///
/// Uniqueness key: (owner, date, hour).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySample {
    pub owner: UserId,
    pub date: NaiveDate,
    /// 0..=23.
    pub hour: u32,
    /// 0.0..=1.0.
    pub energy_level: f64,
    pub stage: EnergyStage,
    /// Decorative; not consumed by the scheduling core.
    pub mood_label: Option<String>,
    pub has_manual_check_in: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Running arithmetic mean of all recorded `EnergySample` levels for one
/// hour of the day.
///
/// Uniqueness key: (owner, hour).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalEnergyPattern {
    pub owner: UserId,
    /// 0..=23.
    pub hour: u32,
    /// 0.0..=1.0.
    pub average_energy: f64,
    /// 0 means the row is an estimated default, never backed by a sample.
    pub sample_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl HistoricalEnergyPattern {
    /// Fold a new sample into the running mean, bumping `sample_count`.
    pub fn fold_sample(&mut self, level: f64, at: DateTime<Utc>) {
        let n = self.sample_count;
        self.average_energy = (self.average_energy * n as f64 + level) / (n + 1) as f64;
        self.sample_count = n + 1;
        self.last_updated = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_sample_computes_running_mean() {
        let mut pattern = HistoricalEnergyPattern {
            owner: UserId::from("u1"),
            hour: 9,
            average_energy: 0.8,
            sample_count: 1,
            last_updated: Utc::now(),
        };
        pattern.fold_sample(0.6, Utc::now());
        assert!((pattern.average_energy - 0.7).abs() < 1e-9);
        assert_eq!(pattern.sample_count, 2);
    }
}
