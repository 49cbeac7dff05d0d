use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::IgnoredAny;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::SwoogoSettings;
use crate::error::FetchError;
use crate::metrics::GatewayMetrics;
use crate::oauth::TokenAcquirer;
use crate::resources::Resource;

pub const COLLECTION_PREFIX: &str = "/api/v1";

/// Upstream JSON body, forwarded without re-serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload(Bytes);

impl UpstreamPayload {
    /// A successful read with no body is forwarded as the JSON empty string.
    const EMPTY: &'static [u8] = b"\"\"";

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl IntoResponse for UpstreamPayload {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.0,
        )
            .into_response()
    }
}

/// One fresh token per read, then one GET against the resource collection.
#[derive(Clone)]
pub struct AuthenticatedReader {
    client: Client,
    tokens: TokenAcquirer,
    api_base: String,
    default_event_id: String,
    metrics: Arc<GatewayMetrics>,
}

impl AuthenticatedReader {
    pub fn new(client: Client, settings: &SwoogoSettings, metrics: Arc<GatewayMetrics>) -> Self {
        let tokens = TokenAcquirer::new(client.clone(), settings, metrics.clone());
        Self {
            client,
            tokens,
            api_base: settings.api_base.clone(),
            default_event_id: settings.default_event_id.clone(),
            metrics,
        }
    }

    pub fn collection_url(&self, resource: Resource) -> String {
        format!("{}{}/{}", self.api_base, COLLECTION_PREFIX, resource.path())
    }

    /// `event_id` is ignored for collections that are not event-scoped.
    pub async fn read_resource(
        &self,
        resource: Resource,
        event_id: Option<&str>,
    ) -> Result<UpstreamPayload, FetchError> {
        let token = self
            .tokens
            .acquire_token()
            .await
            .map_err(|source| FetchError::Auth { resource, source })?;
        debug!(%resource, token_issued_at = %token.issued_at(), "Reading upstream collection");

        let started = Instant::now();
        let result = self.fetch(resource, event_id, token.secret()).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        self.metrics.record_upstream(resource.path(), outcome, started.elapsed());

        if let Err(err) = &result {
            match err {
                FetchError::Rejected { status, body, .. } => {
                    warn!(%resource, %status, body = %body, "Upstream read failed");
                }
                other => warn!(%resource, error = %other, "Upstream read failed"),
            }
        }
        result
    }

    async fn fetch(
        &self,
        resource: Resource,
        event_id: Option<&str>,
        bearer: &str,
    ) -> Result<UpstreamPayload, FetchError> {
        let query = resource
            .descriptor()
            .query_pairs(event_id, &self.default_event_id);

        let response = self
            .client
            .get(self.collection_url(resource))
            .query(&query)
            .bearer_auth(bearer)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Rejected { resource, status, body });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(UpstreamPayload(Bytes::from_static(UpstreamPayload::EMPTY)));
        }
        serde_json::from_slice::<IgnoredAny>(&body).map_err(|err| FetchError::Decode {
            resource,
            reason: err.to_string(),
        })?;
        Ok(UpstreamPayload(body))
    }
}
