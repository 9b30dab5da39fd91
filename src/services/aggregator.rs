use std::time::Duration;

use futures::future::join_all;

use crate::models::{BusyInterval, TimeWindow};
use crate::services::calendar::{CalendarReader, GatewayError, PRIMARY_IDENTITY};

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFailure {
    pub identity: String,
    pub error: GatewayError,
}

/// Some calendars could not be read; results may show fewer conflicts than
/// really exist.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAggregationWarning {
    pub failures: Vec<IdentityFailure>,
}

impl std::fmt::Display for PartialAggregationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .failures
            .iter()
            .map(|failure| format!("{} ({})", failure.identity, failure.error))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "could not check {} calendar(s): {names}; suggested times may conflict",
            self.failures.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("could not read your own calendar: {0}")]
    PrimaryUnavailable(GatewayError),

    #[error("could not read any calendar ({} failed)", .0.len())]
    AllUnavailable(Vec<IdentityFailure>),
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Raw, possibly overlapping and unordered.
    pub intervals: Vec<BusyInterval>,
    pub warning: Option<PartialAggregationWarning>,
}

pub struct BusyIntervalAggregator<'a> {
    reader: &'a dyn CalendarReader,
    timeout: Duration,
    tolerate_total_failure: bool,
}

impl<'a> BusyIntervalAggregator<'a> {
    pub fn new(reader: &'a dyn CalendarReader, timeout: Duration) -> Self {
        Self {
            reader,
            timeout,
            tolerate_total_failure: false,
        }
    }

    /// Degrade total failure to "no busy intervals" plus a warning.
    pub fn tolerate_total_failure(mut self, tolerate: bool) -> Self {
        self.tolerate_total_failure = tolerate;
        self
    }

    async fn fetch_one(
        &self,
        identity: &str,
        window: &TimeWindow,
    ) -> Result<Vec<BusyInterval>, GatewayError> {
        let events = tokio::time::timeout(self.timeout, self.reader.list_events(identity, window))
            .await
            .map_err(|_| GatewayError::TimedOut(format!("no response after {:?}", self.timeout)))??;

        // All-day and date-only events never block slots.
        let intervals = events
            .iter()
            .filter_map(|event| event.timed_range())
            .map(|(start, end)| BusyInterval {
                start,
                end,
                identity: identity.to_string(),
            })
            .collect();
        Ok(intervals)
    }

    /// Busy intervals for the primary calendar plus every attendee in
    /// `identities`, fetched concurrently.
    pub async fn fetch_busy(
        &self,
        window: &TimeWindow,
        identities: &[String],
    ) -> Result<Aggregation, AggregationError> {
        let mut calendars: Vec<&str> = vec![PRIMARY_IDENTITY];
        calendars.extend(
            identities
                .iter()
                .map(String::as_str)
                .filter(|id| *id != PRIMARY_IDENTITY),
        );

        let results = join_all(calendars.iter().map(|id| self.fetch_one(id, window))).await;

        let mut intervals = Vec::new();
        let mut failures = Vec::new();
        let mut primary_error = None;

        for (identity, result) in calendars.iter().zip(results) {
            match result {
                Ok(found) => {
                    tracing::debug!(identity, busy = found.len(), "fetched busy intervals");
                    intervals.extend(found);
                }
                Err(error) => {
                    tracing::warn!(identity, error = %error, "failed to fetch calendar");
                    if *identity == PRIMARY_IDENTITY {
                        primary_error = Some(error.clone());
                    }
                    failures.push(IdentityFailure {
                        identity: identity.to_string(),
                        error,
                    });
                }
            }
        }

        let all_failed = failures.len() == calendars.len();
        if !self.tolerate_total_failure {
            if all_failed {
                return Err(AggregationError::AllUnavailable(failures));
            }
            if let Some(error) = primary_error {
                return Err(AggregationError::PrimaryUnavailable(error));
            }
        }

        tracing::info!(
            calendars = calendars.len(),
            failed = failures.len(),
            busy = intervals.len(),
            "aggregated busy intervals"
        );

        let warning = if failures.is_empty() {
            None
        } else {
            Some(PartialAggregationWarning { failures })
        };

        Ok(Aggregation { intervals, warning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    use crate::models::{CalendarEvent, EventTime};

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(&format!("2025-06-16 {s}"), "%Y-%m-%d %H:%M")
            .unwrap()
            .and_utc()
    }

    fn timed(from: &str, until: &str) -> CalendarEvent {
        CalendarEvent {
            id: None,
            summary: None,
            start: EventTime::At(dt(from)),
            end: EventTime::At(dt(until)),
        }
    }

    fn all_day() -> CalendarEvent {
        let day = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        CalendarEvent {
            id: None,
            summary: Some("Out of office".to_string()),
            start: EventTime::AllDay(day),
            end: EventTime::AllDay(day.succ_opt().unwrap()),
        }
    }

    enum Reply {
        Events(Vec<CalendarEvent>),
        Fail(GatewayError),
        Hang,
    }

    struct MockReader {
        replies: HashMap<String, Reply>,
    }

    impl MockReader {
        fn new(replies: Vec<(&str, Reply)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(id, reply)| (id.to_string(), reply))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl CalendarReader for MockReader {
        async fn list_events(
            &self,
            identity: &str,
            _window: &TimeWindow,
        ) -> Result<Vec<CalendarEvent>, GatewayError> {
            match self.replies.get(identity) {
                Some(Reply::Events(events)) => Ok(events.clone()),
                Some(Reply::Fail(e)) => Err(e.clone()),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
                None => Err(GatewayError::NotFound(identity.to_string())),
            }
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(dt("09:00"), dt("17:00")).unwrap()
    }

    fn attendees(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_primary_is_always_queried() {
        let reader = MockReader::new(vec![("primary", Reply::Events(vec![timed("10:00", "11:00")]))]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let result = agg.fetch_busy(&window(), &[]).await.unwrap();
        assert_eq!(result.intervals.len(), 1);
        assert_eq!(result.intervals[0].identity, "primary");
        assert!(result.warning.is_none());
    }

    #[tokio::test]
    async fn test_all_day_events_are_excluded() {
        let reader = MockReader::new(vec![
            ("primary", Reply::Events(vec![all_day(), timed("13:00", "14:00")])),
            ("a@x.com", Reply::Events(vec![all_day()])),
        ]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let result = agg.fetch_busy(&window(), &attendees(&["a@x.com"])).await.unwrap();
        assert_eq!(result.intervals.len(), 1);
        assert_eq!(result.intervals[0].start, dt("13:00"));
    }

    #[tokio::test]
    async fn test_attendee_failure_is_partial() {
        let reader = MockReader::new(vec![
            ("primary", Reply::Events(vec![timed("10:00", "11:00")])),
            ("a@x.com", Reply::Fail(GatewayError::RateLimited("slow down".to_string()))),
            ("b@x.com", Reply::Events(vec![timed("15:00", "16:00")])),
        ]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let result = agg
            .fetch_busy(&window(), &attendees(&["a@x.com", "b@x.com"]))
            .await
            .unwrap();

        assert_eq!(result.intervals.len(), 2);
        let warning = result.warning.unwrap();
        assert_eq!(warning.failures.len(), 1);
        assert_eq!(warning.failures[0].identity, "a@x.com");
        assert!(matches!(warning.failures[0].error, GatewayError::RateLimited(_)));
        assert!(warning.to_string().contains("a@x.com"));
    }

    #[tokio::test]
    async fn test_primary_failure_aborts() {
        let reader = MockReader::new(vec![
            ("primary", Reply::Fail(GatewayError::Auth("expired".to_string()))),
            ("a@x.com", Reply::Events(vec![])),
        ]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let err = agg
            .fetch_busy(&window(), &attendees(&["a@x.com"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregationError::PrimaryUnavailable(GatewayError::Auth(_))));
    }

    #[tokio::test]
    async fn test_total_failure_lists_every_calendar() {
        let reader = MockReader::new(vec![
            ("primary", Reply::Fail(GatewayError::Auth("expired".to_string()))),
            ("a@x.com", Reply::Fail(GatewayError::NotFound("a@x.com".to_string()))),
        ]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let err = agg
            .fetch_busy(&window(), &attendees(&["a@x.com"]))
            .await
            .unwrap_err();

        match err {
            AggregationError::AllUnavailable(failures) => {
                let ids: Vec<_> = failures.iter().map(|f| f.identity.as_str()).collect();
                assert_eq!(ids, vec!["primary", "a@x.com"]);
            }
            other => panic!("expected AllUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lone_primary_failure_is_total() {
        let reader = MockReader::new(vec![(
            "primary",
            Reply::Fail(GatewayError::Http("503".to_string())),
        )]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let err = agg.fetch_busy(&window(), &[]).await.unwrap_err();
        assert!(matches!(err, AggregationError::AllUnavailable(ref f) if f.len() == 1));
        assert_eq!(err.to_string(), "could not read any calendar (1 failed)");
    }

    #[tokio::test]
    async fn test_total_failure_can_be_tolerated() {
        let reader = MockReader::new(vec![(
            "primary",
            Reply::Fail(GatewayError::Http("503".to_string())),
        )]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5))
            .tolerate_total_failure(true);
        let result = agg
            .fetch_busy(&window(), &attendees(&["missing@x.com"]))
            .await
            .unwrap();
        assert!(result.intervals.is_empty());
        assert_eq!(result.warning.unwrap().failures.len(), 2);
    }

    #[tokio::test]
    async fn test_unresponsive_calendar_times_out() {
        let reader = MockReader::new(vec![
            ("primary", Reply::Events(vec![timed("09:00", "09:30")])),
            ("slow@x.com", Reply::Hang),
        ]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_millis(50));
        let result = agg
            .fetch_busy(&window(), &attendees(&["slow@x.com"]))
            .await
            .unwrap();
        assert_eq!(result.intervals.len(), 1);
        let warning = result.warning.unwrap();
        assert!(matches!(warning.failures[0].error, GatewayError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_primary_listed_as_attendee_is_not_fetched_twice() {
        let reader = MockReader::new(vec![("primary", Reply::Events(vec![timed("10:00", "11:00")]))]);
        let agg = BusyIntervalAggregator::new(&reader, Duration::from_secs(5));
        let result = agg
            .fetch_busy(&window(), &attendees(&["primary"]))
            .await
            .unwrap();
        assert_eq!(result.intervals.len(), 1);
    }
}
