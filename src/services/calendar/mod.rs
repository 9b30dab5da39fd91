pub mod credentials;
pub mod google;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::{CalendarEvent, CreateEventRequest, MeetingRecord, TimeWindow};

/// Calendar id Google uses for the authenticated user's own calendar.
pub const PRIMARY_IDENTITY: &str = "primary";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("not authorized: {0}")]
    Auth(String),

    #[error("calendar not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = format!("{status}: {}", body.trim());
        match status {
            StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited(detail),
            StatusCode::FORBIDDEN
                if body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded") =>
            {
                GatewayError::RateLimited(detail)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth(detail),
            StatusCode::NOT_FOUND => GatewayError::NotFound(detail),
            _ => GatewayError::Http(detail),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::TimedOut(e.to_string())
        } else if e.is_decode() {
            GatewayError::Malformed(e.to_string())
        } else {
            GatewayError::Http(e.to_string())
        }
    }
}

#[async_trait]
pub trait CalendarReader: Send + Sync {
    /// Events on `identity`'s calendar that intersect `window`.
    async fn list_events(
        &self,
        identity: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CalendarEvent>, GatewayError>;
}

#[async_trait]
pub trait CalendarWriter: Send + Sync {
    /// Create the event on the primary calendar, requesting a conferencing
    /// link and attendee notifications in the same call.
    async fn create_event(&self, request: &CreateEventRequest)
        -> Result<MeetingRecord, GatewayError>;
}
