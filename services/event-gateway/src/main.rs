use anyhow::Context;
use event_gateway::{build_router, AppState, GatewayConfig, GatewayMetrics};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    let metrics = Arc::new(GatewayMetrics::new()?);
    let state = AppState::from_config(&config, metrics);
    let app = build_router(state, &config);

    let addr = config.bind_addr()?;
    info!(%addr, static_dir = %config.static_dir, "starting event-gateway");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
