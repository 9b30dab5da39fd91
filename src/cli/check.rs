use chrono::Utc;

use crate::config::AppConfig;
use crate::models::TimeWindow;
use crate::services::calendar::PRIMARY_IDENTITY;
use crate::state::AppState;

/// Report configuration problems and try one read of the primary calendar.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("Checking configuration...");

    let mut ok = true;
    for (label, result) in [
        ("scheduling policy", config.validate()),
        ("language model", config.require_llm()),
        ("Google Calendar", config.require_google()),
    ] {
        match result {
            Ok(()) => println!("  ok    {label}"),
            Err(e) => {
                ok = false;
                println!("  FAIL  {label}: {e}");
            }
        }
    }
    anyhow::ensure!(ok, "configuration incomplete");

    let state = AppState::from_config(config)?;

    let now = Utc::now();
    let window = TimeWindow::new(now, now + chrono::Duration::hours(1))?;
    match state
        .calendar_reader
        .list_events(PRIMARY_IDENTITY, &window)
        .await
    {
        Ok(events) => {
            println!("  ok    calendar reachable ({} event(s) in the next hour)", events.len());
        }
        Err(e) => {
            println!("  FAIL  calendar: {e}");
            anyhow::bail!("calendar check failed");
        }
    }

    println!("All systems ready.");
    Ok(())
}
