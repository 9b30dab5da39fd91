use chrono::NaiveDate;

use crate::models::{ExtractedMeeting, MeetingIntent};
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are a meeting request parser. Extract the meeting details from the user's request.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "title": "meeting title/subject",
  "duration": 60,
  "attendees": ["email addresses of invited people"],
  "preferred_date": "YYYY-MM-DD or null",
  "preferred_time": "HH:MM (24-hour) or null",
  "description": "meeting description/agenda or null"
}

Rules:
- duration is in minutes; use 60 when the request does not say
- attendees only contains email addresses that appear in the request
- resolve relative dates ("tomorrow", "next monday") against today's date
"#;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("the language model could not be reached: {0}")]
    Provider(String),

    #[error("could not understand the meeting request")]
    Unusable { raw: String },

    #[error("meeting duration must be a positive number of minutes, got {0}")]
    InvalidDuration(String),

    #[error("could not understand the date {0:?}; use YYYY-MM-DD")]
    InvalidDate(String),
}

pub async fn parse_meeting_request(
    llm: &dyn LlmProvider,
    request: &str,
    today: NaiveDate,
    default_duration: u32,
) -> Result<MeetingIntent, ParseError> {
    let system = format!("{SYSTEM_PROMPT}\nToday's date is {}.", today.format("%Y-%m-%d (%A)"));

    let response = llm
        .chat(&system, &[Message::user(request)])
        .await
        .map_err(|e| ParseError::Provider(format!("{e:#}")))?;

    let extracted = decode_response(&response).ok_or_else(|| {
        tracing::warn!("failed to parse LLM response as meeting JSON");
        ParseError::Unusable { raw: response.clone() }
    })?;

    into_intent(extracted, default_duration)
}

fn decode_response(response: &str) -> Option<ExtractedMeeting> {
    if let Ok(meeting) = serde_json::from_str::<ExtractedMeeting>(response) {
        return Some(meeting);
    }

    // Strip markdown code fences
    let trimmed = response.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(meeting) = serde_json::from_str::<ExtractedMeeting>(cleaned) {
        return Some(meeting);
    }

    // Outermost object embedded in prose
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ExtractedMeeting>(&cleaned[start..=end]).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn into_intent(extracted: ExtractedMeeting, default_duration: u32) -> Result<MeetingIntent, ParseError> {
    let duration_minutes = match extracted.duration {
        None => default_duration,
        Some(raw) => raw
            .value()
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| u32::try_from(minutes).ok())
            .ok_or_else(|| ParseError::InvalidDuration(raw.to_string()))?,
    };

    let mut attendees: Vec<String> = Vec::new();
    for email in extracted.attendees.unwrap_or_default() {
        let email = email.trim().to_string();
        if !email.is_empty() && !attendees.contains(&email) {
            attendees.push(email);
        }
    }

    Ok(MeetingIntent {
        title: non_blank(extracted.title).unwrap_or_else(|| "Meeting".to_string()),
        duration_minutes,
        attendees,
        preferred_date: non_blank(extracted.preferred_date),
        preferred_time: non_blank(extracted.preferred_time),
        description: non_blank(extracted.description),
    })
}
