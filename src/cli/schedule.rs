use std::io::{self, BufRead, Write};

use crate::cli::render::{parse_selection, render_intent, render_record, render_slots};
use crate::models::MeetingRecord;
use crate::services::scheduling::{confirm_meeting, schedule_meeting};
use crate::state::AppState;

pub async fn run(state: &AppState, request: &str) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    interact(state, request, &mut input, &mut out).await?;
    Ok(())
}

/// Propose slots for `request`, then read selections from `input` until a
/// meeting is created or the user gives up. A failed creation leaves the
/// proposal intact so another slot can be tried.
pub async fn interact<R: BufRead, W: Write>(
    state: &AppState,
    request: &str,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<MeetingRecord>> {
    let proposal = schedule_meeting(state, request).await?;

    write!(out, "{}", render_intent(&proposal.intent))?;
    write!(out, "\n{}", render_slots(&proposal.search))?;

    if proposal.search.no_slots_found() {
        return Ok(None);
    }

    let slots = &proposal.search.slots;
    loop {
        write!(
            out,
            "\nSelect a time slot (1-{}), or press Enter to cancel: ",
            slots.len()
        )?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            writeln!(out, "Cancelled.")?;
            return Ok(None);
        }

        let Some(index) = parse_selection(&line, slots.len()) else {
            writeln!(out, "Invalid selection: {}", line.trim())?;
            continue;
        };

        let slot = &slots[index];
        writeln!(
            out,
            "Creating meeting for {} ({})...",
            slot.display_label,
            slot.start.format("%Y-%m-%d")
        )?;

        let record = confirm_meeting(state, &proposal.intent, slot).await;
        write!(out, "{}", render_record(&record))?;
        if record.success {
            return Ok(Some(record));
        }
        writeln!(out, "You can pick another slot.")?;
    }
}
