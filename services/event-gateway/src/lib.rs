pub mod app;
pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod oauth;
pub mod payment;
pub mod reader;
pub mod resources;

pub use crate::app::build_router;
pub use crate::app_state::AppState;
pub use crate::config::{ClientCredentials, GatewayConfig};
pub use crate::error::{AuthError, ChargeError, FetchError};
pub use crate::metrics::GatewayMetrics;
pub use crate::oauth::{AccessToken, TokenAcquirer};
pub use crate::payment::{
    ChargeOrder, ChargeReceipt, ChargeRequest, ChargeResult, PaymentGateway, PaymentProcessor,
    StripeProcessor,
};
pub use crate::reader::{AuthenticatedReader, UpstreamPayload};
pub use crate::resources::Resource;
