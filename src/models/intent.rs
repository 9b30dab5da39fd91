use serde::{Deserialize, Serialize};

/// Structured meeting request, produced by the intent parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingIntent {
    pub title: String,
    pub duration_minutes: u32,
    pub attendees: Vec<String>,
    /// As given by the parser; normalised when slots are resolved.
    pub preferred_date: Option<String>,
    /// Advisory only, never enforced by the slot search.
    pub preferred_time: Option<String>,
    pub description: Option<String>,
}

/// The JSON shape the language model is asked to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedMeeting {
    pub title: Option<String>,
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<Minutes>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub description: Option<String>,
}

/// Models occasionally quote numbers or emit `30.0`, so accept all three.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Minutes {
    Number(i64),
    Float(f64),
    Text(String),
}

impl Minutes {
    /// Whole minutes, if the value is one.
    pub fn value(&self) -> Option<i64> {
        match self {
            Minutes::Number(n) => Some(*n),
            Minutes::Float(f) => whole(*f),
            Minutes::Text(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
        }
    }
}

fn whole(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

impl std::fmt::Display for Minutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Minutes::Number(n) => write!(f, "{n}"),
            Minutes::Float(n) => write!(f, "{n}"),
            Minutes::Text(s) => write!(f, "{s:?}"),
        }
    }
}
