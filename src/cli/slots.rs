use crate::cli::render::render_slots;
use crate::services::scheduling::resolve;
use crate::state::AppState;

pub async fn run(
    state: &AppState,
    date: Option<&str>,
    duration_minutes: Option<u32>,
    attendees: &[String],
) -> anyhow::Result<()> {
    let duration_minutes =
        duration_minutes.unwrap_or(state.config.policy.default_duration_minutes);
    let search = resolve(state, date, duration_minutes, attendees).await?;
    print!("{}", render_slots(&search));
    Ok(())
}
