use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_http_errors::{ApiError, ApiResult, ERROR_CODE_HEADER};
use serde::Deserialize;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::payment::{ChargeRequest, ChargeResult, IDEMPOTENCY_KEY_HEADER};
use crate::reader::UpstreamPayload;
use crate::resources::Resource;

#[derive(Debug, Default, Deserialize)]
pub struct EventScope {
    pub event_id: Option<String>,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> ApiResult<Response> {
    state.metrics.render().map_err(ApiError::internal)
}

pub const INVALID_PAYMENT_REQUEST: &str = "invalid_payment_request";

/// Body-level failures answer with the same `{success:false,message}` shape as processor errors.
pub async fn process_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChargeRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected payment request body");
            let mut resp = ChargeResult::failed(rejection.body_text()).into_response();
            resp.headers_mut().insert(
                ERROR_CODE_HEADER,
                HeaderValue::from_static(INVALID_PAYMENT_REQUEST),
            );
            return resp;
        }
    };
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let span = info_span!("process_payment", request_id = %Uuid::new_v4(), amount = req.amount);
    state
        .payments
        .charge_payment_with_key(&req.token, req.amount, idempotency_key)
        .instrument(span)
        .await
        .into_response()
}

async fn read(state: &AppState, resource: Resource, event_id: Option<&str>) -> ApiResult<UpstreamPayload> {
    let span = info_span!("upstream_read", request_id = %Uuid::new_v4(), %resource);
    Ok(state
        .reader
        .read_resource(resource, event_id)
        .instrument(span)
        .await?)
}

/// An unparseable query string fails the read like any other upstream failure.
async fn scoped_read(
    state: &AppState,
    resource: Resource,
    scope: Result<Query<EventScope>, QueryRejection>,
) -> ApiResult<UpstreamPayload> {
    match scope {
        Ok(Query(scope)) => read(state, resource, scope.event_id.as_deref()).await,
        Err(rejection) => {
            warn!(%resource, error = %rejection, "Rejected read query string");
            let descriptor = resource.descriptor();
            Err(ApiError::upstream(descriptor.error_code, descriptor.failure_message()))
        }
    }
}

pub async fn list_events(State(state): State<AppState>) -> ApiResult<UpstreamPayload> {
    read(&state, Resource::Events, None).await
}

pub async fn list_reg_types(
    State(state): State<AppState>,
    scope: Result<Query<EventScope>, QueryRejection>,
) -> ApiResult<UpstreamPayload> {
    scoped_read(&state, Resource::RegTypes, scope).await
}

pub async fn list_registrants(
    State(state): State<AppState>,
    scope: Result<Query<EventScope>, QueryRejection>,
) -> ApiResult<UpstreamPayload> {
    scoped_read(&state, Resource::Registrants, scope).await
}

pub async fn list_discounts(
    State(state): State<AppState>,
    scope: Result<Query<EventScope>, QueryRejection>,
) -> ApiResult<UpstreamPayload> {
    scoped_read(&state, Resource::Discounts, scope).await
}
