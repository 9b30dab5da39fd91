use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// 12-hour rendering of `start`, e.g. "09:30 AM". Presentation only.
    pub display_label: String,
}

impl CandidateSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            display_label: start.format("%I:%M %p").to_string(),
        }
    }
}

// Equality and ordering ignore the label.
impl PartialEq for CandidateSlot {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for CandidateSlot {}

impl PartialOrd for CandidateSlot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateSlot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.start, self.end).cmp(&(other.start, other.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_display_label_uses_12_hour_clock() {
        let morning = CandidateSlot::new(dt("2025-06-16 09:30"), dt("2025-06-16 10:30"));
        assert_eq!(morning.display_label, "09:30 AM");

        let afternoon = CandidateSlot::new(dt("2025-06-16 14:00"), dt("2025-06-16 15:00"));
        assert_eq!(afternoon.display_label, "02:00 PM");
    }

    #[test]
    fn test_label_does_not_affect_equality() {
        let a = CandidateSlot::new(dt("2025-06-16 09:00"), dt("2025-06-16 10:00"));
        let mut b = a.clone();
        b.display_label = "nine o'clock".to_string();
        assert_eq!(a, b);
    }
}
