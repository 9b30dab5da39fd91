use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use super::GatewayError;
use crate::db::queries;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens are treated as expired this long before Google says they are.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens to the calendar gateways.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A usable access token, refreshing when none is cached or it expired.
    async fn access_token(&self) -> Result<String, GatewayError>;

    /// Unconditionally obtain a fresh access token.
    async fn refresh(&self) -> Result<String, GatewayError>;

    /// Forget any cached access token.
    async fn invalidate(&self);
}

/// A fixed token, e.g. from `GOOGLE_ACCESS_TOKEN`. Cannot be refreshed.
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Result<String, GatewayError> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> Result<String, GatewayError> {
        Err(GatewayError::Auth(
            "static access token was rejected and cannot be refreshed".to_string(),
        ))
    }

    async fn invalidate(&self) {}
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Google OAuth credentials backed by a refresh token in the credential store.
pub struct OAuthCredentials {
    client_id: String,
    client_secret: String,
    token_url: String,
    account: String,
    db: Arc<Mutex<Connection>>,
    client: reqwest::Client,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

impl OAuthCredentials {
    pub fn new(
        client_id: String,
        client_secret: String,
        token_url: String,
        account: String,
        db: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            token_url,
            account,
            db,
            client: reqwest::Client::new(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    fn stored_refresh_token(&self) -> Result<String, GatewayError> {
        let token = {
            let db = self
                .db
                .lock()
                .map_err(|_| GatewayError::Auth("credential store lock poisoned".to_string()))?;
            queries::get_refresh_token(&db, &self.account)
        };

        match token {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(GatewayError::Auth(format!(
                "no refresh token stored for {}; run `meeting-scheduler auth` first",
                self.account
            ))),
            Err(e) => Err(GatewayError::Auth(format!("failed to read credential store: {e}"))),
        }
    }

    fn forget_refresh_token(&self) {
        if let Ok(db) = self.db.lock() {
            if let Err(e) = queries::delete_refresh_token(&db, &self.account) {
                tracing::error!(error = %e, "failed to delete revoked refresh token");
            }
        }
    }

    async fn request_token(&self) -> Result<CachedToken, GatewayError> {
        let refresh_token = self.stored_refresh_token()?;

        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if body.contains("invalid_grant") {
                tracing::warn!(account = %self.account, "refresh token revoked, removing it");
                self.forget_refresh_token();
                return Err(GatewayError::Auth(format!(
                    "refresh token for {} was revoked; run `meeting-scheduler auth` again",
                    self.account
                )));
            }
            return Err(GatewayError::from_status(status, &body));
        }

        let token: TokenResponse = resp.json().await?;
        let lifetime = token.expires_in.unwrap_or(3600) - EXPIRY_MARGIN_SECS;

        tracing::debug!(account = %self.account, "refreshed access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime.max(0)),
        })
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentials {
    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn refresh(&self) -> Result<String, GatewayError> {
        let mut cached = self.cached.lock().await;
        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn invalidate(&self) {
        self.cached.lock().await.take();
    }
}

/// URL the user opens to grant calendar access.
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{GOOGLE_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(CALENDAR_SCOPE)
    )
}

pub async fn exchange_code_for_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> anyhow::Result<TokenResponse> {
    let resp = reqwest::Client::new()
        .post(token_url)
        .form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("failed to call Google token endpoint")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("token exchange failed ({status}): {body}");
    }

    resp.json()
        .await
        .context("failed to parse token exchange response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let url = authorization_url("abc.apps.googleusercontent.com", OOB_REDIRECT_URI);
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=abc.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fcalendar"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let creds = StaticCredentials::new("tok".to_string());
        assert_eq!(creds.access_token().await.unwrap(), "tok");
        assert!(matches!(creds.refresh().await, Err(GatewayError::Auth(_))));
    }
}
