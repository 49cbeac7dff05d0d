use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::StripeSettings;
use crate::error::ChargeError;
use crate::metrics::{GatewayMetrics, UPSTREAM_CHARGE};

pub const CHARGE_CURRENCY: &str = "cad";
pub const CHARGE_DESCRIPTION: &str = "Test charge";
pub const NEXT_STEP_CONFIRMATION: &str = "confirmation";
pub const CHARGES_PATH: &str = "/v1/charges";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Body of `POST /process-payment`. `amount` is in minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeRequest {
    pub token: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChargeResult {
    pub fn confirmed() -> Self {
        Self {
            success: true,
            next_step: Some(NEXT_STEP_CONFIRMATION.to_string()),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            next_step: None,
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for ChargeResult {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// What is sent to the processor for one charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOrder {
    pub source: String,
    pub amount: i64,
    pub currency: &'static str,
    pub description: &'static str,
    pub idempotency_key: Option<String>,
}

/// Processor's view of a created charge. Logged, never returned to clients.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeReceipt {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_charge(&self, order: &ChargeOrder) -> Result<ChargeReceipt, ChargeError>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
}

pub struct StripeProcessor {
    client: Client,
    charges_url: String,
    secret_key: String,
}

impl StripeProcessor {
    pub fn new(client: Client, settings: &StripeSettings) -> Self {
        Self {
            client,
            charges_url: format!("{}{}", settings.api_base, CHARGES_PATH),
            secret_key: settings.secret_key.clone(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_charge(&self, order: &ChargeOrder) -> Result<ChargeReceipt, ChargeError> {
        let amount = order.amount.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", order.currency),
            ("source", order.source.as_str()),
            ("description", order.description),
        ];
        let mut request = self
            .client
            .post(&self.charges_url)
            .bearer_auth(&self.secret_key)
            .form(&form);
        if let Some(key) = &order.idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(ChargeError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ChargeError::Transport)?;

        if status.is_success() {
            return serde_json::from_str::<ChargeReceipt>(&body)
                .map_err(|err| ChargeError::Decode(err.to_string()));
        }

        match serde_json::from_str::<StripeErrorEnvelope>(&body) {
            Ok(StripeErrorEnvelope { error }) => Err(ChargeError::Declined {
                status,
                code: error.decline_code.or(error.code),
                message: error
                    .message
                    .unwrap_or_else(|| format!("Payment processor returned HTTP {status}")),
            }),
            Err(_) => Err(ChargeError::Decode(format!("HTTP {status}: {body}"))),
        }
    }
}

/// Single-attempt charges with a fixed currency and description.
#[derive(Clone)]
pub struct PaymentGateway {
    processor: Arc<dyn PaymentProcessor>,
    metrics: Arc<GatewayMetrics>,
}

impl PaymentGateway {
    pub fn new(processor: Arc<dyn PaymentProcessor>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { processor, metrics }
    }

    pub async fn charge_payment(&self, token: &str, amount: i64) -> ChargeResult {
        self.charge_payment_with_key(token, amount, None).await
    }

    /// No retry on failure; a key is only attached when the client supplied one.
    pub async fn charge_payment_with_key(
        &self,
        token: &str,
        amount: i64,
        idempotency_key: Option<&str>,
    ) -> ChargeResult {
        let order = ChargeOrder {
            source: token.to_string(),
            amount,
            currency: CHARGE_CURRENCY,
            description: CHARGE_DESCRIPTION,
            idempotency_key: idempotency_key.map(str::to_string),
        };

        let started = Instant::now();
        let result = self.processor.create_charge(&order).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        self.metrics.record_upstream(UPSTREAM_CHARGE, outcome, started.elapsed());

        match result {
            Ok(receipt) => {
                info!(
                    charge_id = %receipt.id,
                    amount = receipt.amount,
                    status = %receipt.status,
                    "Charge created"
                );
                ChargeResult::confirmed()
            }
            Err(err) => {
                if let ChargeError::Declined { status, code, .. } = &err {
                    error!(%status, code = ?code, error = %err, "Payment failed");
                } else {
                    error!(error = %err, kind = err.kind(), "Payment failed");
                }
                ChargeResult::failed(err.public_message())
            }
        }
    }
}
