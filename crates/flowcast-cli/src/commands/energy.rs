//! Energy tracking: record hourly samples, inspect historical patterns.

use clap::Subcommand;
use flowcast_core::{EnergySample, EnergyStage, FlowCastCore, Store, UserId};

fn parse_stage(raw: &str) -> Result<EnergyStage, String> {
    match raw.to_lowercase().replace('-', "_").as_str() {
        "morning_rise" => Ok(EnergyStage::MorningRise),
        "morning_peak" => Ok(EnergyStage::MorningPeak),
        "midday_dip" => Ok(EnergyStage::MiddayDip),
        "afternoon_rebound" => Ok(EnergyStage::AfternoonRebound),
        "wind_down" => Ok(EnergyStage::WindDown),
        "sleep_phase" => Ok(EnergyStage::SleepPhase),
        other => Err(format!("invalid stage '{other}'")),
    }
}

/// Rough default label by hour-of-day, used only when the caller omits
/// `--stage`; the scheduling core never reads this back out.
fn default_stage(hour: u32) -> EnergyStage {
    match hour {
        6..=8 => EnergyStage::MorningRise,
        9..=11 => EnergyStage::MorningPeak,
        12..=14 => EnergyStage::MiddayDip,
        15..=17 => EnergyStage::AfternoonRebound,
        18..=22 => EnergyStage::WindDown,
        _ => EnergyStage::SleepPhase,
    }
}

#[derive(Subcommand)]
pub enum EnergyAction {
    /// Record an hourly energy sample, folding it into historical patterns
    Record {
        /// Hour of day, 0..=23
        hour: u32,
        /// Energy level, 0.0..=1.0
        level: f64,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        stage: Option<String>,
    },
    /// Show the user's historical per-hour running averages
    Patterns,
}

pub async fn run<S: Store>(
    core: &FlowCastCore<S>,
    owner: &UserId,
    action: EnergyAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        EnergyAction::Record { hour, level, mood, stage } => {
            let stage = match stage {
                Some(s) => parse_stage(&s)?,
                None => default_stage(hour),
            };
            let now = chrono::Utc::now();
            let sample = EnergySample {
                owner: owner.clone(),
                date: now.date_naive(),
                hour,
                energy_level: level,
                stage,
                mood_label: mood,
                has_manual_check_in: true,
                recorded_at: now,
            };
            core.record_energy_sample(owner, sample).await?;
            println!("Recorded energy sample for hour {hour}.");
        }
        EnergyAction::Patterns => {
            let patterns = core.list_patterns(owner).await?;
            println!("{}", serde_json::to_string_pretty(&patterns)?);
        }
    }
    Ok(())
}
