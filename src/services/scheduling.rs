use chrono::NaiveDate;

use crate::models::{
    CandidateSlot, CreateEventRequest, InvalidWindow, MeetingIntent, MeetingRecord, TimeWindow,
};
use crate::services::aggregator::{AggregationError, BusyIntervalAggregator, PartialAggregationWarning};
use crate::services::ai::intent::{parse_meeting_request, ParseError};
use crate::services::dates::normalize_date;
use crate::services::slots::find_slots;
use crate::state::AppState;

#[derive(Debug)]
pub enum SchedulingError {
    Parse(ParseError),
    Aggregation(AggregationError),
    InvalidWindow(InvalidWindow),
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::Parse(e) => write!(f, "Could not parse meeting request: {e}"),
            SchedulingError::Aggregation(e) => {
                write!(f, "Could not check calendar availability: {e}")
            }
            SchedulingError::InvalidWindow(e) => {
                write!(f, "Business hours are misconfigured: {e}")
            }
        }
    }
}

impl std::error::Error for SchedulingError {}

impl From<ParseError> for SchedulingError {
    fn from(e: ParseError) -> Self {
        SchedulingError::Parse(e)
    }
}

impl From<AggregationError> for SchedulingError {
    fn from(e: AggregationError) -> Self {
        SchedulingError::Aggregation(e)
    }
}

impl From<InvalidWindow> for SchedulingError {
    fn from(e: InvalidWindow) -> Self {
        SchedulingError::InvalidWindow(e)
    }
}

/// Result of an availability search on one day.
#[derive(Debug, Clone)]
pub struct SlotSearch {
    pub date: NaiveDate,
    pub window: TimeWindow,
    /// At most the configured number of candidates, earliest first.
    pub slots: Vec<CandidateSlot>,
    pub warning: Option<PartialAggregationWarning>,
}

impl SlotSearch {
    /// The search ran but every slot conflicts. Not a failure.
    pub fn no_slots_found(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SchedulingProposal {
    pub intent: MeetingIntent,
    pub search: SlotSearch,
}

/// Free slots on `date` (today when absent) for the primary calendar plus
/// `attendees`.
pub async fn resolve(
    state: &AppState,
    date: Option<&str>,
    duration_minutes: u32,
    attendees: &[String],
) -> Result<SlotSearch, SchedulingError> {
    let policy = &state.config.policy;

    let date = normalize_date(date, state.clock.today())?;
    let window = TimeWindow::on_date(date, policy.business_start, policy.business_end)?;

    let aggregation = BusyIntervalAggregator::new(state.calendar_reader.as_ref(), policy.fetch_timeout)
        .tolerate_total_failure(policy.allow_unavailable_calendars)
        .fetch_busy(&window, attendees)
        .await?;

    let mut slots = find_slots(
        &window,
        duration_minutes,
        &aggregation.intervals,
        policy.granularity_minutes,
    );
    let found = slots.len();
    slots.truncate(policy.max_candidates);

    tracing::info!(
        date = %date,
        duration_minutes,
        attendees = attendees.len(),
        found,
        partial = aggregation.warning.is_some(),
        "resolved candidate slots"
    );

    Ok(SlotSearch {
        date,
        window,
        slots,
        warning: aggregation.warning,
    })
}

/// Parse a free-text request and search for slots that fit it.
pub async fn schedule_meeting(
    state: &AppState,
    request: &str,
) -> Result<SchedulingProposal, SchedulingError> {
    let intent = parse_meeting_request(
        state.llm.as_ref(),
        request,
        state.clock.today(),
        state.config.policy.default_duration_minutes,
    )
    .await?;

    tracing::info!(
        title = %intent.title,
        duration_minutes = intent.duration_minutes,
        attendees = intent.attendees.len(),
        "parsed meeting request"
    );

    let search = resolve(
        state,
        intent.preferred_date.as_deref(),
        intent.duration_minutes,
        &intent.attendees,
    )
    .await?;

    Ok(SchedulingProposal { intent, search })
}

pub fn build_create_request(intent: &MeetingIntent, slot: &CandidateSlot) -> CreateEventRequest {
    CreateEventRequest {
        title: intent.title.clone(),
        description: intent.description.clone().unwrap_or_default(),
        attendees: intent.attendees.clone(),
        start: slot.start,
        end: slot.end,
        conferencing: true,
        notify_attendees: true,
    }
}

/// Create the meeting in `slot`. Gateway failures come back as a failed
/// record; `intent` and the other slots stay usable for another attempt.
pub async fn confirm_meeting(
    state: &AppState,
    intent: &MeetingIntent,
    slot: &CandidateSlot,
) -> MeetingRecord {
    let request = build_create_request(intent, slot);

    match state.calendar_writer.create_event(&request).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(error = %e, start = %slot.start, "failed to create meeting");
            MeetingRecord::failed(e.to_string())
        }
    }
}
