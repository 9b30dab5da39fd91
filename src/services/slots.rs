use chrono::Duration;

use crate::models::{BusyInterval, CandidateSlot, TimeWindow};

pub const DEFAULT_GRANULARITY_MINUTES: u32 = 30;

/// Scan `window` for free slots of `duration_minutes`, stepping candidate
/// starts by `granularity_minutes` from `window.start` up to and including
/// `window.end - duration`. A slot is free iff it overlaps no busy interval
/// (half-open, so touching boundaries are free).
///
/// `busy` may be unordered and overlapping. Output is in ascending start
/// order. A zero duration or granularity, or a window shorter than the
/// duration, yields no slots.
pub fn find_slots(
    window: &TimeWindow,
    duration_minutes: u32,
    busy: &[BusyInterval],
    granularity_minutes: u32,
) -> Vec<CandidateSlot> {
    if duration_minutes == 0 || granularity_minutes == 0 {
        return Vec::new();
    }

    let duration = Duration::minutes(i64::from(duration_minutes));
    let step = Duration::minutes(i64::from(granularity_minutes));

    let mut slots = Vec::new();
    let mut current = window.start;

    while current + duration <= window.end {
        let slot_end = current + duration;
        if !busy.iter().any(|b| b.overlaps(current, slot_end)) {
            slots.push(CandidateSlot::new(current, slot_end));
        }
        current += step;
    }

    slots
}
