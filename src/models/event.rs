use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

/// One event as returned by a calendar read gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::AllDay(_)) || matches!(self.end, EventTime::AllDay(_))
    }

    /// Explicit start/end timestamps, or `None` for all-day and date-only events.
    pub fn timed_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (&self.start, &self.end) {
            (EventTime::At(start), EventTime::At(end)) => Some((*start, *end)),
            _ => None,
        }
    }
}
