//! Calendar management: add a fixed event, list the day's placements.

use clap::Subcommand;
use flowcast_core::{FlowCastCore, ScheduleItem, ScheduleItemId, ScheduleItemType, Store, UserId};
use uuid::Uuid;

fn parse_instant(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    raw.parse()
        .map_err(|e| format!("invalid timestamp '{raw}' (expected RFC3339, e.g. 2026-07-28T14:00:00Z): {e}"))
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Add a fixed calendar event; auto-scheduled tasks that now conflict
    /// with it are cascaded to the next available slot
    AddEvent {
        title: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Remove a calendar event, rebalancing any tasks it freed up
    RemoveEvent { id: String },
    /// List every task placement and fixed event on the calendar
    List,
}

pub async fn run<S: Store>(
    core: &FlowCastCore<S>,
    owner: &UserId,
    action: ScheduleAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::AddEvent { title, start, end } => {
            let start_time = parse_instant(&start)?;
            let end_time = parse_instant(&end)?;
            let event = ScheduleItem {
                id: ScheduleItemId::from(Uuid::new_v4().to_string().as_str()),
                owner: owner.clone(),
                title,
                start_time,
                end_time,
                item_type: ScheduleItemType::Event,
                task_id: None,
            };
            let notifications = core.on_new_event(owner, event, chrono::Utc::now()).await?;
            for n in &notifications {
                println!("note[{:?}]: {}", n.severity, n.message);
            }
        }
        ScheduleAction::RemoveEvent { id } => {
            let notifications = core
                .remove_event(owner, &ScheduleItemId::from(id.as_str()), chrono::Utc::now())
                .await?;
            for n in &notifications {
                println!("note[{:?}]: {}", n.severity, n.message);
            }
        }
        ScheduleAction::List => {
            let mut items = core.list_schedule(owner).await?;
            items.sort_by_key(|item| item.start_time);
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }
    Ok(())
}
