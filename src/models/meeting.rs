use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the calendar write gateway is asked to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub attendees: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub conferencing: bool,
    pub notify_attendees: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub success: bool,
    pub external_id: Option<String>,
    pub external_link: Option<String>,
    pub conferencing_link: Option<String>,
    pub error_detail: Option<String>,
}

impl MeetingRecord {
    pub fn created(
        external_id: String,
        external_link: Option<String>,
        conferencing_link: Option<String>,
    ) -> Self {
        Self {
            success: true,
            external_id: Some(external_id),
            external_link,
            conferencing_link,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            external_id: None,
            external_link: None,
            conferencing_link: None,
            error_detail: Some(detail.into()),
        }
    }
}
