use reqwest::Client;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;
use crate::payment::{PaymentGateway, PaymentProcessor, StripeProcessor};
use crate::reader::AuthenticatedReader;

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<AuthenticatedReader>,
    pub payments: Arc<PaymentGateway>,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Wires the Stripe processor and the event provider reader from configuration.
    pub fn from_config(config: &GatewayConfig, metrics: Arc<GatewayMetrics>) -> Self {
        let client = Client::new();
        let processor = Arc::new(StripeProcessor::new(client.clone(), &config.stripe));
        Self::with_processor(config, client, processor, metrics)
    }

    pub fn with_processor(
        config: &GatewayConfig,
        client: Client,
        processor: Arc<dyn PaymentProcessor>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let reader = AuthenticatedReader::new(client, &config.swoogo, metrics.clone());
        let payments = PaymentGateway::new(processor, metrics.clone());
        Self {
            reader: Arc::new(reader),
            payments: Arc::new(payments),
            metrics,
        }
    }
}
