//! Sleep schedule and the per-user scheduling profile (timezone + sleep).

use serde::{Deserialize, Serialize};

use super::UserId;

/// Shifts the energy curve earlier or later in the wake window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chronotype {
    Morning,
    Evening,
    Neutral,
}

impl Default for Chronotype {
    fn default() -> Self {
        Chronotype::Neutral
    }
}

/// A user's sleep window. May cross midnight: `bedtime >= wake_hour` means
/// the wake period straddles midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SleepSchedule {
    /// 0..=23.
    pub bedtime: u32,
    /// 0..=23.
    pub wake_hour: u32,
    pub chronotype: Chronotype,
}

impl SleepSchedule {
    /// True iff `hour` falls in the closed-open sleep window
    /// `[bedtime, wake_hour)`, handling the midnight wrap.
    pub fn is_sleep_hour(&self, hour: u32) -> bool {
        if self.bedtime == self.wake_hour {
            // A zero-width wake window never happens in practice; treat as
            // "asleep all day" rather than panicking on the wrap math.
            return true;
        }
        if self.bedtime < self.wake_hour {
            hour >= self.bedtime && hour < self.wake_hour
        } else {
            hour >= self.bedtime || hour < self.wake_hour
        }
    }

    /// True iff `hour` falls within the 2-hour late-wind-down window
    /// immediately preceding bedtime.
    pub fn is_late_wind_down_hour(&self, hour: u32) -> bool {
        let window_start = (self.bedtime + 24 - crate::constants::LATE_WIND_DOWN_HOURS as u32) % 24;
        // The window is [window_start, bedtime), which never wraps past
        // bedtime itself but may wrap past midnight.
        if window_start <= self.bedtime {
            hour >= window_start && hour < self.bedtime
        } else {
            hour >= window_start || hour < self.bedtime
        }
    }

    /// Length of the wake window in hours (1..=24).
    pub fn wake_window_hours(&self) -> u32 {
        if self.bedtime > self.wake_hour {
            self.bedtime - self.wake_hour
        } else {
            24 - (self.wake_hour - self.bedtime)
        }
    }
}

/// Per-user scheduling profile: timezone for all local-time math, plus the
/// sleep schedule that bounds and shapes the energy curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingProfile {
    pub owner: UserId,
    #[serde(with = "tz_serde")]
    pub timezone: chrono_tz::Tz,
    pub sleep_schedule: SleepSchedule,
}

mod tz_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tz: &chrono_tz::Tz, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<chrono_tz::Tz, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
