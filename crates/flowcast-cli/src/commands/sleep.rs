//! Sleep schedule and timezone profile management.

use clap::Subcommand;
use flowcast_core::{Chronotype, FlowCastCore, SchedulingProfile, SleepSchedule, Store, UserId};

fn parse_chronotype(raw: &str) -> Result<Chronotype, String> {
    match raw.to_lowercase().as_str() {
        "morning" => Ok(Chronotype::Morning),
        "evening" => Ok(Chronotype::Evening),
        "neutral" => Ok(Chronotype::Neutral),
        other => Err(format!("invalid chronotype '{other}' (expected morning, evening, or neutral)")),
    }
}

#[derive(Subcommand)]
pub enum SleepAction {
    /// Set the user's timezone and sleep window
    Set {
        /// IANA timezone name, e.g. America/New_York
        #[arg(long)]
        timezone: String,
        /// Bedtime hour, 0..=23
        #[arg(long)]
        bedtime: u32,
        /// Wake hour, 0..=23
        #[arg(long)]
        wake_hour: u32,
        #[arg(long, default_value = "neutral")]
        chronotype: String,
    },
    /// Show the current profile
    Show,
}

pub async fn run<S: Store>(
    core: &FlowCastCore<S>,
    owner: &UserId,
    action: SleepAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SleepAction::Set {
            timezone,
            bedtime,
            wake_hour,
            chronotype,
        } => {
            let tz: chrono_tz::Tz = timezone
                .parse()
                .map_err(|_| format!("invalid IANA timezone '{timezone}'"))?;
            let chronotype = parse_chronotype(&chronotype)?;
            let profile = SchedulingProfile {
                owner: owner.clone(),
                timezone: tz,
                sleep_schedule: SleepSchedule {
                    bedtime,
                    wake_hour,
                    chronotype,
                },
            };
            core.put_profile(profile.clone()).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        SleepAction::Show => match core.get_profile(owner).await? {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => println!("No profile set for this user yet."),
        },
    }
    Ok(())
}
