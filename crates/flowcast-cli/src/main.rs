use std::sync::Arc;

use clap::{Parser, Subcommand};
use flowcast_core::{FlowCastCore, InMemoryStore, UserId};
use tracing_subscriber::EnvFilter;

mod commands;
mod store;

#[derive(Parser)]
#[command(name = "flowcast", version)]
#[command(about = "Energy-aware personal task scheduler", long_about = None)]
struct Cli {
    /// User id to operate as (defaults to $FLOWCAST_USER, then "default")
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management: create, update, reschedule, list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Calendar management: add fixed events, list the day's placements
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Energy tracking: record samples, inspect historical patterns
    Energy {
        #[command(subcommand)]
        action: commands::energy::EnergyAction,
    },
    /// Sleep schedule and timezone profile management
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
}

fn resolve_owner(cli_user: Option<String>) -> UserId {
    cli_user
        .or_else(|| std::env::var("FLOWCAST_USER").ok())
        .map(UserId::from)
        .unwrap_or_else(|| UserId::from("default"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let owner = resolve_owner(cli.user);

    let snapshot = match store::load_snapshot() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error loading store: {e}");
            std::process::exit(1);
        }
    };
    let inner = Arc::new(InMemoryStore::from_snapshot(snapshot));
    let core = FlowCastCore::new(inner.clone());

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(&core, &owner, action).await,
        Commands::Schedule { action } => commands::schedule::run(&core, &owner, action).await,
        Commands::Energy { action } => commands::energy::run(&core, &owner, action).await,
        Commands::Sleep { action } => commands::sleep::run(&core, &owner, action).await,
    };

    let snapshot = inner.snapshot().await;
    if let Err(e) = store::save_snapshot(&snapshot) {
        eprintln!("error saving store: {e}");
        std::process::exit(1);
    }

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
