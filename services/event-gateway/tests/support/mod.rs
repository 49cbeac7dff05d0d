#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use event_gateway::{
    AppState, ChargeError, ChargeOrder, ChargeReceipt, ClientCredentials, GatewayConfig,
    GatewayMetrics, PaymentProcessor,
};
use reqwest::Client;
use std::sync::{Arc, Mutex};

pub const CLIENT_ID: &str = "gateway-client";
pub const CLIENT_SECRET: &str = "s3cret";
pub const STRIPE_KEY: &str = "sk_test_gateway";
pub const FALLBACK_EVENT_ID: &str = "219985";

pub fn basic_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}

pub fn config_for(provider_base: &str, stripe_base: &str) -> GatewayConfig {
    GatewayConfig::new(STRIPE_KEY, ClientCredentials::new(CLIENT_ID, CLIENT_SECRET))
        .with_swoogo_api_base(provider_base)
        .with_stripe_api_base(stripe_base)
}

/// Loopback-only client; ignores any proxy configured in the environment.
pub fn client() -> Client {
    Client::builder().no_proxy().build().expect("http client")
}

pub fn metrics() -> Arc<GatewayMetrics> {
    Arc::new(GatewayMetrics::new().expect("metrics"))
}

pub fn state_with(config: &GatewayConfig, processor: Arc<dyn PaymentProcessor>) -> AppState {
    AppState::with_processor(config, client(), processor, metrics())
}

pub enum StubOutcome {
    Approve,
    Decline(&'static str),
}

/// Records every charge it receives.
pub struct RecordingProcessor {
    outcome: StubOutcome,
    pub orders: Mutex<Vec<ChargeOrder>>,
}

impl RecordingProcessor {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self { outcome: StubOutcome::Approve, orders: Mutex::new(Vec::new()) })
    }

    pub fn declining(message: &'static str) -> Arc<Self> {
        Arc::new(Self { outcome: StubOutcome::Decline(message), orders: Mutex::new(Vec::new()) })
    }

    pub fn orders(&self) -> Vec<ChargeOrder> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProcessor for RecordingProcessor {
    async fn create_charge(&self, order: &ChargeOrder) -> Result<ChargeReceipt, ChargeError> {
        self.orders.lock().unwrap().push(order.clone());
        match self.outcome {
            StubOutcome::Approve => Ok(ChargeReceipt {
                id: "ch_stub".to_string(),
                amount: order.amount,
                status: "succeeded".to_string(),
            }),
            StubOutcome::Decline(message) => Err(ChargeError::Declined {
                status: reqwest::StatusCode::PAYMENT_REQUIRED,
                code: Some("card_declined".to_string()),
                message: message.to_string(),
            }),
        }
    }
}
