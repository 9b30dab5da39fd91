use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

use crate::services::ai::intent::ParseError;

/// Source of "today". The only place wall-clock time enters scheduling.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// First `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Resolve a requested meeting date. Absent or blank means `today`; accepts
/// `YYYY-MM-DD`, `today`, `tomorrow`, `next week` (next Monday) and
/// `next <weekday>`.
pub fn normalize_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let raw = match input.map(str::trim) {
        None | Some("") => return Ok(today),
        Some(raw) => raw,
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    let lowered = raw.to_lowercase();
    let resolved = match lowered.as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "next week" => next_weekday(today, Weekday::Mon),
        other => other
            .strip_prefix("next ")
            .and_then(|day| parse_weekday(day.trim()))
            .and_then(|weekday| next_weekday(today, weekday)),
    };

    resolved.ok_or_else(|| ParseError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2025-06-18 is a Wednesday
    const TODAY: &str = "2025-06-18";

    #[test]
    fn test_absent_or_blank_is_today() {
        assert_eq!(normalize_date(None, date(TODAY)).unwrap(), date(TODAY));
        assert_eq!(normalize_date(Some("  "), date(TODAY)).unwrap(), date(TODAY));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(
            normalize_date(Some("2025-07-01"), date(TODAY)).unwrap(),
            date("2025-07-01")
        );
    }

    #[test]
    fn test_relative_dates() {
        let today = date(TODAY);
        assert_eq!(normalize_date(Some("Today"), today).unwrap(), today);
        assert_eq!(normalize_date(Some("tomorrow"), today).unwrap(), date("2025-06-19"));
        assert_eq!(normalize_date(Some("next week"), today).unwrap(), date("2025-06-23"));
        assert_eq!(normalize_date(Some("next Monday"), today).unwrap(), date("2025-06-23"));
        assert_eq!(normalize_date(Some("next fri"), today).unwrap(), date("2025-06-20"));
    }

    #[test]
    fn test_next_same_weekday_is_a_week_out() {
        assert_eq!(
            normalize_date(Some("next wednesday"), date(TODAY)).unwrap(),
            date("2025-06-25")
        );
    }

    #[test]
    fn test_invalid_dates() {
        for raw in ["2025-02-30", "someday", "next blursday", "06/20/2025"] {
            let err = normalize_date(Some(raw), date(TODAY)).unwrap_err();
            assert!(matches!(err, ParseError::InvalidDate(_)), "{raw}");
        }
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(date(TODAY)).today(), date(TODAY));
    }
}
