use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod check;
pub mod render;
pub mod schedule;
pub mod slots;

use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Subcommand)]
enum Command {
    /// Schedule a meeting from a natural language request
    Schedule {
        /// e.g. "Team standup tomorrow with john@example.com for 30 minutes"
        request: String,
    },
    /// Show free slots without parsing a request
    Slots {
        /// YYYY-MM-DD, "tomorrow", "next monday"... (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Meeting length in minutes (default: DEFAULT_MEETING_MINUTES)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        duration: Option<u32>,

        /// Attendee calendar to check (repeatable)
        #[arg(long = "attendee")]
        attendees: Vec<String>,
    },
    /// Authorize Google Calendar access and store the refresh token
    Auth {
        /// Account name to store the token under (default: GOOGLE_ACCOUNT)
        #[arg(long)]
        account: Option<String>,
    },
    /// Check configuration and calendar connectivity
    Check {},
    /// Show example usage
    Example {},
}

#[derive(Parser)]
#[command(author, version, about = "Schedule meetings using natural language", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

fn print_examples() {
    println!("Example usage:");
    println!();
    println!("1. Schedule a meeting:");
    println!("   meeting-scheduler schedule \"Team standup tomorrow at 10am with john@example.com for 30 minutes\"");
    println!();
    println!("2. List free slots for a day:");
    println!("   meeting-scheduler slots --date 2025-06-16 --duration 45 --attendee jane@example.com");
    println!();
    println!("3. Authorize Google Calendar:");
    println!("   meeting-scheduler auth");
    println!();
    println!("4. Check configuration:");
    println!("   meeting-scheduler check");
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::from_env();

    match args.command {
        Some(Command::Schedule { request }) => {
            config.require_llm()?;
            let state = AppState::from_config(config)?;
            schedule::run(&state, &request).await?;
        }
        Some(Command::Slots {
            date,
            duration,
            attendees,
        }) => {
            let state = AppState::from_config(config)?;
            slots::run(&state, date.as_deref(), duration, &attendees).await?;
        }
        Some(Command::Auth { account }) => {
            auth::run(&config, account).await?;
        }
        Some(Command::Check {}) => {
            check::run(config).await?;
        }
        Some(Command::Example {}) | None => print_examples(),
    }

    Ok(())
}
