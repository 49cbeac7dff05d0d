use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use common_http_errors::http_error_metrics_layer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::handlers::{
    health, list_discounts, list_events, list_reg_types, list_registrants, metrics_endpoint,
    process_payment,
};

pub const SERVICE_NAME: &str = "event-gateway";

pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origins = match allowed_origins {
        Some(origins) => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ),
        None => AllowOrigin::from(Any),
    };
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("idempotency-key"),
        ])
}

/// API routes plus static assets from `config.static_dir` for every other path.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/process-payment", post(process_payment))
        .route("/api/events", get(list_events))
        .route("/api/reg-types", get(list_reg_types))
        .route("/api/registrants", get(list_registrants))
        .route("/api/discounts", get(list_discounts))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
        .layer(cors_layer(config.cors_allowed_origins.as_deref()))
}
