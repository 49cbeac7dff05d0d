use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Upper bound on distinct `code` label values; later codes fold into `overflow`.
const MAX_ERROR_CODES: usize = 40;
const OVERFLOW_CODE: &str = "overflow";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// An upstream dependency failed. Only `message` reaches the caller.
    UpstreamFailure { code: &'static str, message: String },
    BadRequest { code: &'static str, message: Option<String> },
    Internal { message: Option<String> },
}

impl ApiError {
    pub fn upstream(code: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamFailure { code, message: message.into() }
    }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { message: Some(e.to_string()) }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UpstreamFailure { code, .. } => *code,
            ApiError::BadRequest { code, .. } => *code,
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_code = self.code();
        let (status, message) = match self {
            ApiError::UpstreamFailure { message, .. } => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, message.unwrap_or_else(|| code.to_string()))
            }
            ApiError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                message.unwrap_or_else(|| "internal error".to_string()),
            ),
        };
        let mut resp = (status, Json(ErrorBody { error: message })).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

struct ErrorMetrics {
    registry: Registry,
    errors_total: IntCounterVec,
    distinct_codes: IntGauge,
    overflow_total: IntCounter,
    seen: Mutex<HashSet<String>>,
}

impl ErrorMetrics {
    fn new() -> Self {
        let registry = Registry::new();
        let errors_total = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )
        .expect("http_errors_total definition");
        let distinct_codes = IntGauge::new(
            "http_error_codes_distinct",
            "Distinct error codes currently used as labels",
        )
        .expect("http_error_codes_distinct definition");
        let overflow_total = IntCounter::new(
            "http_error_code_overflow_total",
            "Error responses whose code was folded into the overflow label",
        )
        .expect("http_error_code_overflow_total definition");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("register errors_total");
        registry
            .register(Box::new(distinct_codes.clone()))
            .expect("register distinct_codes");
        registry
            .register(Box::new(overflow_total.clone()))
            .expect("register overflow_total");
        Self {
            registry,
            errors_total,
            distinct_codes,
            overflow_total,
            seen: Mutex::new(HashSet::new()),
        }
    }

    fn label_for<'a>(&self, code: &'a str) -> &'a str {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if seen.contains(code) {
            return code;
        }
        if seen.len() < MAX_ERROR_CODES {
            seen.insert(code.to_string());
            self.distinct_codes.set(seen.len() as i64);
            return code;
        }
        self.overflow_total.inc();
        OVERFLOW_CODE
    }

    fn record(&self, service: &str, code: &str, status: StatusCode) {
        let label = self.label_for(code);
        self.errors_total
            .with_label_values(&[service, label, status.as_str()])
            .inc();
    }
}

static METRICS: Lazy<ErrorMetrics> = Lazy::new(ErrorMetrics::new);

/// Metric families recorded by [`http_error_metrics_layer`].
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    METRICS.registry.gather()
}

type MetricsFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Middleware for `axum::middleware::from_fn` counting every response with status >= 400.
/// The code label comes from the `X-Error-Code` header, or `unclassified` when absent.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> MetricsFuture + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let response = next.run(request).await;
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                let code = response
                    .headers()
                    .get(ERROR_CODE_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("unclassified");
                METRICS.record(service, code, status);
            }
            response
        })
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::METRICS;
    use axum::http::StatusCode;

    pub fn simulate_error_code(code: &str) {
        METRICS.record("test", code, StatusCode::BAD_REQUEST);
    }

    pub fn distinct_gauge() -> i64 {
        METRICS.distinct_codes.get()
    }

    pub fn overflow_count() -> u64 {
        METRICS.overflow_total.get()
    }
}
