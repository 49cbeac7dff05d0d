use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

pub const UPSTREAM_TOKEN: &str = "oauth_token";
pub const UPSTREAM_CHARGE: &str = "charge";

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    upstream_requests: IntCounterVec,
    upstream_latency: HistogramVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "gateway_upstream_requests_total",
                "Upstream calls grouped by target and outcome",
            ),
            &["upstream", "outcome"],
        )?;
        let upstream_latency = HistogramVec::new(
            HistogramOpts::new(
                "gateway_upstream_latency_seconds",
                "Latency of upstream calls",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]),
            &["upstream"],
        )?;
        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(upstream_latency.clone()))?;
        Ok(Self {
            registry,
            upstream_requests,
            upstream_latency,
        })
    }

    /// `outcome` is `ok` or an error kind such as `rejected`.
    pub fn record_upstream(&self, upstream: &str, outcome: &str, elapsed: Duration) {
        self.upstream_requests
            .with_label_values(&[upstream, outcome])
            .inc();
        self.upstream_latency
            .with_label_values(&[upstream])
            .observe(elapsed.as_secs_f64());
    }

    pub fn upstream_count(&self, upstream: &str, outcome: &str) -> u64 {
        self.upstream_requests
            .with_label_values(&[upstream, outcome])
            .get()
    }

    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut metric_families = self.registry.gather();
        metric_families.extend(common_http_errors::gather());
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn render(&self) -> Result<Response> {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(self.encode()?))?;
        Ok(response)
    }
}
