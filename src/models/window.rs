use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("window start {start} is not before end {end}")]
pub struct InvalidWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if start >= end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window between two wall-clock times on `date`, read as UTC.
    pub fn on_date(date: NaiveDate, from: NaiveTime, until: NaiveTime) -> Result<Self, InvalidWindow> {
        Self::new(date.and_time(from).and_utc(), date.and_time(until).and_utc())
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

/// A half-open `[start, end)` range during which `identity` is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub identity: String,
}

impl BusyInterval {
    /// Half-open overlap: touching boundaries do not conflict.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}
