use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use scheme_eligibility::eligibility::{eligibility_router, EligibilityService};
use scheme_eligibility::records::{records_router, RecordStore, RecordsService};
use serde_json::json;
use std::sync::Arc;

/// Full route table over a single shared store, plus the operational endpoints.
pub(crate) fn with_record_routes<S>(store: Arc<S>) -> axum::Router
where
    S: RecordStore + 'static,
{
    let records = Arc::new(RecordsService::new(store.clone()));
    let eligibility = Arc::new(EligibilityService::new(store));

    records_router(records)
        .merge(eligibility_router(eligibility))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
