use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::db;
use crate::errors::AppError;
use crate::services::ai::gemini::GeminiProvider;
use crate::services::ai::groq::GroqProvider;
use crate::services::ai::ollama::OllamaProvider;
use crate::services::ai::LlmProvider;
use crate::services::calendar::credentials::{CredentialProvider, OAuthCredentials, StaticCredentials};
use crate::services::calendar::google::GoogleCalendarClient;
use crate::services::calendar::{CalendarReader, CalendarWriter};
use crate::services::dates::{Clock, SystemClock};

pub struct AppState {
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub calendar_reader: Arc<dyn CalendarReader>,
    pub calendar_writer: Arc<dyn CalendarWriter>,
    pub clock: Box<dyn Clock>,
}

impl AppState {
    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        config.require_google()?;

        let llm = build_llm(&config);
        let credentials = build_credentials(&config)?;
        let calendar = Arc::new(GoogleCalendarClient::new(
            config.google_calendar_api_url.clone(),
            credentials,
        ));

        Ok(Self {
            config,
            llm,
            calendar_reader: calendar.clone(),
            calendar_writer: calendar,
            clock: Box::new(SystemClock),
        })
    }
}

pub fn build_llm(config: &AppConfig) -> Box<dyn LlmProvider> {
    match config.llm_provider.as_str() {
        "groq" => {
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
            Box::new(GeminiProvider::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ))
        }
    }
}

pub fn build_credentials(config: &AppConfig) -> Result<Arc<dyn CredentialProvider>, AppError> {
    if let Some(token) = &config.google_access_token {
        tracing::info!("using static Google access token");
        return Ok(Arc::new(StaticCredentials::new(token.clone())));
    }

    let conn = db::init_db(&config.database_url)
        .map_err(|e| AppError::Database(format!("{e:#}")))?;

    Ok(Arc::new(OAuthCredentials::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_token_url.clone(),
        config.google_account.clone(),
        Arc::new(Mutex::new(conn)),
    )))
}
