use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::credentials::CredentialProvider;
use super::{CalendarReader, CalendarWriter, GatewayError, PRIMARY_IDENTITY};
use crate::models::{CalendarEvent, CreateEventRequest, EventTime, MeetingRecord, TimeWindow};

pub const GOOGLE_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Upper bound on pages read for one calendar and window.
const MAX_EVENT_PAGES: usize = 20;

/// Google Calendar v3 REST client.
pub struct GoogleCalendarClient {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    id: String,
    html_link: Option<String>,
    conference_data: Option<ConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPoint {
    entry_point_type: Option<String>,
    uri: Option<String>,
}

impl GoogleCalendarClient {
    pub fn new(base_url: String, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// Send with the current token; on 401 invalidate, refresh and retry once.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.credentials.access_token().await?;
        let resp = build(&token).send().await?;

        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("access token rejected, refreshing");
            self.credentials.invalidate().await;
            let token = self.credentials.refresh().await?;
            build(&token).send().await?
        } else {
            resp
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, &body));
        }
        Ok(resp)
    }
}

fn rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn convert_time(time: &GoogleEventTime) -> Option<EventTime> {
    if let Some(raw) = &time.date_time {
        return DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| EventTime::At(dt.with_timezone(&Utc)));
    }
    time.date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .map(EventTime::AllDay)
}

fn convert_event(event: GoogleEvent) -> Option<CalendarEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }
    let start = event.start.as_ref().and_then(convert_time);
    let end = event.end.as_ref().and_then(convert_time);
    match (start, end) {
        (Some(start), Some(end)) => Some(CalendarEvent {
            id: event.id,
            summary: event.summary,
            start,
            end,
        }),
        _ => {
            tracing::warn!(id = ?event.id, "skipping event with unreadable start/end");
            None
        }
    }
}

fn conferencing_link(data: Option<ConferenceData>) -> Option<String> {
    let entry_points = data?.entry_points;
    entry_points
        .iter()
        .find(|e| e.entry_point_type.as_deref() == Some("video"))
        .or_else(|| entry_points.first())
        .and_then(|e| e.uri.clone())
}

#[async_trait]
impl CalendarReader for GoogleCalendarClient {
    async fn list_events(
        &self,
        identity: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CalendarEvent>, GatewayError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(identity)
        );
        let time_min = rfc3339(&window.start);
        let time_max = rfc3339(&window.end);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            pages += 1;
            let resp = self
                .send_authorized(|token| {
                    let mut req = self
                        .client
                        .get(&url)
                        .bearer_auth(token)
                        .query(&[
                            ("timeMin", time_min.as_str()),
                            ("timeMax", time_max.as_str()),
                            ("singleEvents", "true"),
                            ("orderBy", "startTime"),
                        ]);
                    if let Some(page) = &page_token {
                        req = req.query(&[("pageToken", page.as_str())]);
                    }
                    req
                })
                .await?;

            let page: EventList = resp.json().await?;
            events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                None => break,
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(GatewayError::Malformed(format!(
                        "page token {next:?} repeated while listing {identity}"
                    )));
                }
                Some(_) if pages >= MAX_EVENT_PAGES => {
                    return Err(GatewayError::Malformed(format!(
                        "more than {MAX_EVENT_PAGES} pages of events for {identity}"
                    )));
                }
                Some(next) => page_token = Some(next),
            }
        }

        tracing::debug!(identity, count = events.len(), "listed calendar events");
        Ok(events)
    }
}

#[async_trait]
impl CalendarWriter for GoogleCalendarClient {
    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<MeetingRecord, GatewayError> {
        let url = format!("{}/calendars/{}/events", self.base_url, PRIMARY_IDENTITY);

        let mut body = json!({
            "summary": request.title,
            "description": request.description,
            "start": { "dateTime": rfc3339(&request.start), "timeZone": "UTC" },
            "end": { "dateTime": rfc3339(&request.end), "timeZone": "UTC" },
            "attendees": request
                .attendees
                .iter()
                .map(|email| json!({ "email": email }))
                .collect::<Vec<_>>(),
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "email", "minutes": 24 * 60 },
                    { "method": "popup", "minutes": 10 },
                ],
            },
        });

        if request.conferencing {
            body["conferenceData"] = json!({
                "createRequest": {
                    "requestId": format!("meet-{}", uuid::Uuid::new_v4()),
                    "conferenceSolutionKey": { "type": "hangoutsMeet" },
                }
            });
        }

        let send_updates = if request.notify_attendees { "all" } else { "none" };

        let resp = self
            .send_authorized(|token| {
                self.client
                    .post(&url)
                    .bearer_auth(token)
                    .query(&[("conferenceDataVersion", "1"), ("sendUpdates", send_updates)])
                    .json(&body)
            })
            .await?;

        let created: CreatedEvent = resp.json().await?;

        tracing::info!(id = %created.id, "created calendar event");

        Ok(MeetingRecord::created(
            created.id,
            created.html_link,
            conferencing_link(created.conference_data),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_timed_event_to_utc() {
        let event: GoogleEvent = serde_json::from_str(
            r#"{"id":"e1","summary":"Standup","start":{"dateTime":"2025-06-16T10:00:00+02:00"},"end":{"dateTime":"2025-06-16T10:30:00+02:00"}}"#,
        )
        .unwrap();
        let converted = convert_event(event).unwrap();
        let (start, end) = converted.timed_range().unwrap();
        assert_eq!(rfc3339(&start), "2025-06-16T08:00:00Z");
        assert_eq!(rfc3339(&end), "2025-06-16T08:30:00Z");
    }

    #[test]
    fn test_convert_all_day_event() {
        let event: GoogleEvent = serde_json::from_str(
            r#"{"id":"e2","start":{"date":"2025-06-16"},"end":{"date":"2025-06-17"}}"#,
        )
        .unwrap();
        let converted = convert_event(event).unwrap();
        assert!(converted.is_all_day());
        assert!(converted.timed_range().is_none());
    }

    #[test]
    fn test_cancelled_and_broken_events_are_dropped() {
        let cancelled: GoogleEvent = serde_json::from_str(
            r#"{"id":"e3","status":"cancelled","start":{"dateTime":"2025-06-16T10:00:00Z"},"end":{"dateTime":"2025-06-16T11:00:00Z"}}"#,
        )
        .unwrap();
        assert!(convert_event(cancelled).is_none());

        let broken: GoogleEvent =
            serde_json::from_str(r#"{"id":"e4","start":{"dateTime":"not a time"}}"#).unwrap();
        assert!(convert_event(broken).is_none());
    }

    #[test]
    fn test_conferencing_link_prefers_video() {
        let data: ConferenceData = serde_json::from_str(
            r#"{"entryPoints":[{"entryPointType":"phone","uri":"tel:+1-555"},{"entryPointType":"video","uri":"https://meet.google.com/abc"}]}"#,
        )
        .unwrap();
        assert_eq!(
            conferencing_link(Some(data)),
            Some("https://meet.google.com/abc".to_string())
        );
        assert_eq!(conferencing_link(None), None);
    }
}
