use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{ClientCredentials, SwoogoSettings};
use crate::error::AuthError;
use crate::metrics::{GatewayMetrics, UPSTREAM_TOKEN};

pub const TOKEN_PATH: &str = "/api/v1/oauth2/token";

/// Bearer token for a single upstream call. Never cached or shared.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    issued_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 client-credentials client for the event provider.
#[derive(Clone)]
pub struct TokenAcquirer {
    client: Client,
    token_url: String,
    credentials: ClientCredentials,
    metrics: Arc<GatewayMetrics>,
}

impl TokenAcquirer {
    pub fn new(client: Client, settings: &SwoogoSettings, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            client,
            token_url: format!("{}{}", settings.api_base, TOKEN_PATH),
            credentials: settings.credentials.clone(),
            metrics,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Performs a full client-credentials round trip; every call yields a fresh token.
    pub async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let started = Instant::now();
        let result = self.request_token().await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        self.metrics.record_upstream(UPSTREAM_TOKEN, outcome, started.elapsed());
        if let Err(err) = &result {
            match err {
                AuthError::Rejected { status, body } => {
                    warn!(%status, body = %body, "Token error");
                }
                other => warn!(error = %other, "Token error"),
            }
        }
        result
    }

    async fn request_token(&self) -> Result<AccessToken, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;
        debug!("Acquired event provider access token");
        Ok(AccessToken::new(body.access_token))
    }
}
