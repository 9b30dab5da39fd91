//! Plain-text rendering of scheduling results for the terminal.

use crate::models::{MeetingIntent, MeetingRecord};
use crate::services::scheduling::SlotSearch;

pub fn render_intent(intent: &MeetingIntent) -> String {
    let mut out = format!(
        "Meeting:   {}\nDuration:  {} minutes\n",
        intent.title, intent.duration_minutes
    );

    let attendees = if intent.attendees.is_empty() {
        "(none)".to_string()
    } else {
        intent.attendees.join(", ")
    };
    out.push_str(&format!("Attendees: {attendees}\n"));

    if let Some(date) = &intent.preferred_date {
        out.push_str(&format!("Date:      {date}\n"));
    }
    if let Some(time) = &intent.preferred_time {
        out.push_str(&format!("Preferred: {time} (advisory)\n"));
    }
    if let Some(description) = &intent.description {
        out.push_str(&format!("Notes:     {description}\n"));
    }
    out
}

/// Enumerated slot list with 1-based indices, or the no-slots message.
pub fn render_slots(search: &SlotSearch) -> String {
    let mut out = String::new();

    if let Some(warning) = &search.warning {
        out.push_str(&format!("Warning: {warning}\n"));
    }

    if search.no_slots_found() {
        out.push_str(&format!(
            "No available slots found on {}.\n",
            search.date.format("%Y-%m-%d")
        ));
        return out;
    }

    out.push_str("Available time slots:\n");
    for (i, slot) in search.slots.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} ({})\n",
            i + 1,
            slot.display_label,
            slot.start.format("%Y-%m-%d")
        ));
    }
    out
}

pub fn render_record(record: &MeetingRecord) -> String {
    if !record.success {
        return format!(
            "Failed to create meeting: {}\n",
            record.error_detail.as_deref().unwrap_or("unknown error")
        );
    }

    format!(
        "Meeting created.\nEvent link: {}\nMeet link:  {}\n",
        record.external_link.as_deref().unwrap_or("N/A"),
        record.conferencing_link.as_deref().unwrap_or("N/A")
    )
}

/// 1-based user choice to a 0-based index.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    (1..=count).contains(&choice).then(|| choice - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::models::{CandidateSlot, TimeWindow};
    use crate::services::aggregator::{IdentityFailure, PartialAggregationWarning};
    use crate::services::calendar::GatewayError;

    fn search(starts: &[&str]) -> SlotSearch {
        let date = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let slots = starts
            .iter()
            .map(|s| {
                let start = NaiveDateTime::parse_from_str(&format!("2025-06-16 {s}"), "%Y-%m-%d %H:%M")
                    .unwrap()
                    .and_utc();
                CandidateSlot::new(start, start + chrono::Duration::minutes(30))
            })
            .collect();
        SlotSearch {
            date,
            window: TimeWindow::on_date(
                date,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            )
            .unwrap(),
            slots,
            warning: None,
        }
    }

    #[test]
    fn test_render_intent() {
        let intent = MeetingIntent {
            title: "Standup".to_string(),
            duration_minutes: 30,
            attendees: vec!["john@example.com".to_string(), "jane@example.com".to_string()],
            preferred_date: None,
            preferred_time: Some("10:00".to_string()),
            description: Some("Daily sync".to_string()),
        };
        let out = render_intent(&intent);
        assert!(out.contains("Meeting:   Standup"));
        assert!(out.contains("Duration:  30 minutes"));
        assert!(out.contains("Attendees: john@example.com, jane@example.com"));
        assert!(out.contains("Preferred: 10:00 (advisory)"));
        assert!(out.contains("Notes:     Daily sync"));
        assert!(!out.contains("Date:"));
    }

    #[test]
    fn test_render_slots_enumerates_from_one() {
        let out = render_slots(&search(&["09:00", "13:30"]));
        assert!(out.contains("  1. 09:00 AM (2025-06-16)"));
        assert!(out.contains("  2. 01:30 PM (2025-06-16)"));
    }

    #[test]
    fn test_render_no_slots_with_warning() {
        let mut empty = search(&[]);
        empty.warning = Some(PartialAggregationWarning {
            failures: vec![IdentityFailure {
                identity: "a@x.com".to_string(),
                error: GatewayError::NotFound("404".to_string()),
            }],
        });
        let out = render_slots(&empty);
        assert!(out.starts_with("Warning: could not check 1 calendar(s): a@x.com"));
        assert!(out.contains("No available slots found on 2025-06-16."));
    }

    #[test]
    fn test_render_record() {
        let ok = MeetingRecord::created(
            "evt1".to_string(),
            Some("https://calendar.google.com/event?eid=1".to_string()),
            None,
        );
        let out = render_record(&ok);
        assert!(out.contains("Event link: https://calendar.google.com/event?eid=1"));
        assert!(out.contains("Meet link:  N/A"));

        let failed = render_record(&MeetingRecord::failed("quota exceeded"));
        assert_eq!(failed, "Failed to create meeting: quota exceeded\n");
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 3), Some(0));
        assert_eq!(parse_selection(" 3\n", 3), Some(2));
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("two", 3), None);
    }
}
