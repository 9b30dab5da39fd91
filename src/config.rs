use std::env;
use std::time::Duration;

use chrono::NaiveTime;

use crate::errors::AppError;
use crate::services::calendar::credentials::GOOGLE_TOKEN_URL;
use crate::services::calendar::google::GOOGLE_CALENDAR_API_URL;

/// Search policy knobs. Defaults reproduce the fixed 09:00-17:00 UTC,
/// 30-minute, top-3 behaviour.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulingPolicy {
    pub business_start: NaiveTime,
    pub business_end: NaiveTime,
    pub granularity_minutes: u32,
    pub max_candidates: usize,
    pub default_duration_minutes: u32,
    pub fetch_timeout: Duration,
    /// Treat "no calendar could be read" as "nobody is busy".
    pub allow_unavailable_calendars: bool,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            business_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            business_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            granularity_minutes: 30,
            max_candidates: 3,
            default_duration_minutes: 60,
            fetch_timeout: Duration::from_secs(10),
            allow_unavailable_calendars: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_account: String,
    pub google_access_token: Option<String>,
    pub google_calendar_api_url: String,
    pub google_token_url: String,
    pub database_url: String,
    pub policy: SchedulingPolicy,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn time_var(key: &str, default: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").unwrap_or_else(|_| {
            tracing::warn!("{key}={raw} is not HH:MM, using {}", default.format("%H:%M"));
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = SchedulingPolicy::default();
        let policy = SchedulingPolicy {
            business_start: time_var("BUSINESS_HOURS_START", defaults.business_start),
            business_end: time_var("BUSINESS_HOURS_END", defaults.business_end),
            granularity_minutes: parse_var("SLOT_GRANULARITY_MINUTES", defaults.granularity_minutes),
            max_candidates: parse_var("MAX_SUGGESTED_SLOTS", defaults.max_candidates),
            default_duration_minutes: parse_var(
                "DEFAULT_MEETING_MINUTES",
                defaults.default_duration_minutes,
            ),
            fetch_timeout: Duration::from_secs(parse_var(
                "CALENDAR_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),
            allow_unavailable_calendars: parse_var(
                "ALLOW_UNAVAILABLE_CALENDARS",
                defaults.allow_unavailable_calendars,
            ),
        };

        Self {
            llm_provider: var_or("LLM_PROVIDER", "gemini").to_lowercase(),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: var_or("GEMINI_MODEL", "gemini-1.5-flash"),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: var_or("GROQ_MODEL", "llama-3.1-8b-instant"),
            ollama_url: var_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: var_or("OLLAMA_MODEL", "llama3.2"),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_account: var_or("GOOGLE_ACCOUNT", "default"),
            google_access_token: env::var("GOOGLE_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            google_calendar_api_url: var_or("GOOGLE_CALENDAR_API_URL", GOOGLE_CALENDAR_API_URL),
            google_token_url: var_or("GOOGLE_TOKEN_URL", GOOGLE_TOKEN_URL),
            database_url: var_or("DATABASE_URL", "meeting-scheduler.db"),
            policy,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let policy = &self.policy;
        if policy.business_start >= policy.business_end {
            return Err(AppError::Config(format!(
                "business hours start ({}) must be before end ({})",
                policy.business_start.format("%H:%M"),
                policy.business_end.format("%H:%M")
            )));
        }
        if policy.granularity_minutes == 0 {
            return Err(AppError::Config("SLOT_GRANULARITY_MINUTES must be positive".into()));
        }
        if policy.max_candidates == 0 {
            return Err(AppError::Config("MAX_SUGGESTED_SLOTS must be positive".into()));
        }
        if policy.default_duration_minutes == 0 {
            return Err(AppError::Config("DEFAULT_MEETING_MINUTES must be positive".into()));
        }
        if policy.fetch_timeout.is_zero() {
            return Err(AppError::Config("CALENDAR_FETCH_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }

    /// Credentials the selected language model needs.
    pub fn require_llm(&self) -> Result<(), AppError> {
        match self.llm_provider.as_str() {
            "gemini" if self.gemini_api_key.is_empty() => Err(AppError::Config(
                "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini".into(),
            )),
            "groq" if self.groq_api_key.is_empty() => Err(AppError::Config(
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq".into(),
            )),
            "gemini" | "groq" | "ollama" => Ok(()),
            other => Err(AppError::Config(format!("unknown LLM_PROVIDER: {other}"))),
        }
    }

    /// Either a static access token or OAuth client credentials.
    pub fn require_google(&self) -> Result<(), AppError> {
        if self.google_access_token.is_some() {
            return Ok(());
        }
        if self.google_client_id.is_empty() || self.google_client_secret.is_empty() {
            return Err(AppError::Config(
                "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set (or GOOGLE_ACCESS_TOKEN)"
                    .into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            llm_provider: "gemini".to_string(),
            gemini_api_key: "key".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            groq_api_key: String::new(),
            groq_model: "llama-3.1-8b-instant".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_account: "default".to_string(),
            google_access_token: None,
            google_calendar_api_url: GOOGLE_CALENDAR_API_URL.to_string(),
            google_token_url: GOOGLE_TOKEN_URL.to_string(),
            database_url: ":memory:".to_string(),
            policy: SchedulingPolicy::default(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = SchedulingPolicy::default();
        assert_eq!(policy.business_start.format("%H:%M").to_string(), "09:00");
        assert_eq!(policy.business_end.format("%H:%M").to_string(), "17:00");
        assert_eq!(policy.granularity_minutes, 30);
        assert_eq!(policy.max_candidates, 3);
        assert_eq!(policy.default_duration_minutes, 60);
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_inverted_business_hours() {
        let mut cfg = config();
        cfg.policy.business_end = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_granularity() {
        let mut cfg = config();
        cfg.policy.granularity_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_require_llm() {
        let mut cfg = config();
        assert!(cfg.require_llm().is_ok());

        cfg.gemini_api_key.clear();
        assert!(cfg.require_llm().is_err());

        cfg.llm_provider = "ollama".to_string();
        assert!(cfg.require_llm().is_ok());

        cfg.llm_provider = "mystery".to_string();
        assert!(cfg.require_llm().is_err());
    }

    #[test]
    fn test_require_google() {
        let mut cfg = config();
        assert!(cfg.require_google().is_err());

        cfg.google_access_token = Some("tok".to_string());
        assert!(cfg.require_google().is_ok());

        cfg.google_access_token = None;
        cfg.google_client_id = "id".to_string();
        cfg.google_client_secret = "secret".to_string();
        assert!(cfg.require_google().is_ok());
    }
}
