//! Task management commands: create, update, reschedule, list, get.

use clap::Subcommand;
use flowcast_core::{FlowCastCore, PatchedStartTime, Store, TaskId, TaskPatch, TaskTag, UserId};

fn parse_tag(raw: &str) -> Result<TaskTag, String> {
    match raw.to_lowercase().as_str() {
        "deep" => Ok(TaskTag::Deep),
        "creative" => Ok(TaskTag::Creative),
        "admin" => Ok(TaskTag::Admin),
        "personal" => Ok(TaskTag::Personal),
        other => Err(format!(
            "invalid tag '{other}' (expected deep, creative, admin, or personal)"
        )),
    }
}

fn parse_instant(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    raw.parse()
        .map_err(|e| format!("invalid timestamp '{raw}' (expected RFC3339, e.g. 2026-07-28T14:00:00Z): {e}"))
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Estimated duration in minutes (1..=720)
        #[arg(long, default_value_t = 60)]
        duration_minutes: i64,
        /// Priority 1 (lowest) .. 5 (highest)
        #[arg(long, default_value_t = 3)]
        priority: i32,
        /// deep, creative, admin, or personal
        #[arg(long, default_value = "admin")]
        tag: String,
        /// Disable automatic placement by the Decision Engine
        #[arg(long)]
        manual: bool,
        /// RFC3339 instant; a bare date's local midnight means "any hour
        /// this day", triggering initial scheduling
        #[arg(long)]
        start: Option<String>,
        /// RFC3339 deadline instant
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Update an existing task, re-running the Engine if needed
    Update {
        id: String,
        #[arg(long)]
        priority: Option<i32>,
        #[arg(long)]
        duration_minutes: Option<i64>,
        #[arg(long)]
        deadline: Option<String>,
        /// Clear the task's start time, forcing a fresh placement
        #[arg(long)]
        clear_start: bool,
    },
    /// Force a fresh Decision Engine run for an auto-scheduled task
    Reschedule { id: String },
    /// List every task owned by this user
    List,
    /// Show a single task
    Get { id: String },
}

pub async fn run<S: Store>(
    core: &FlowCastCore<S>,
    owner: &UserId,
    action: TaskAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = chrono::Utc::now();
    match action {
        TaskAction::Create {
            title,
            description,
            duration_minutes,
            priority,
            tag,
            manual,
            start,
            deadline,
        } => {
            let tag = parse_tag(&tag)?;
            let start_time = start.map(|s| parse_instant(&s)).transpose()?;
            let end_time = deadline.map(|s| parse_instant(&s)).transpose()?;
            let spec = flowcast_core::NewTaskSpec {
                title,
                description,
                estimated_duration_minutes: duration_minutes,
                priority,
                tag,
                auto_schedule: !manual,
                start_time,
                end_time,
            };
            let (task, notifications) = core.create_task(owner, spec, now).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
            print_notifications(&notifications);
        }
        TaskAction::Update {
            id,
            priority,
            duration_minutes,
            deadline,
            clear_start,
        } => {
            let mut patch = TaskPatch::default();
            patch.priority = priority;
            patch.estimated_duration_minutes = duration_minutes;
            patch.end_time = deadline.map(|s| parse_instant(&s)).transpose()?;
            if clear_start {
                patch.start_time = Some(PatchedStartTime::Cleared);
            }
            let (task, notifications) = core.update_task(owner, &TaskId::from(id.as_str()), patch, now).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
            print_notifications(&notifications);
        }
        TaskAction::Reschedule { id } => {
            let (task, notifications) = core.reschedule_task(owner, &TaskId::from(id.as_str()), now).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
            print_notifications(&notifications);
        }
        TaskAction::List => {
            let tasks = core.list_tasks(owner).await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Get { id } => match core.get_task(owner, &TaskId::from(id.as_str())).await? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => println!("Task not found: {id}"),
        },
    }
    Ok(())
}

fn print_notifications(notifications: &[flowcast_core::Notification]) {
    for n in notifications {
        println!("note[{:?}]: {}", n.severity, n.message);
    }
}
