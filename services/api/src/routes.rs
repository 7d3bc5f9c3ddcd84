use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use staff_eval::workflows::evaluation::{
    evaluation_router, EvaluationRepository, EvaluationService, NotificationPublisher,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_evaluation_routes<R, N>(service: Arc<EvaluationService<R, N>>) -> axum::Router
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let layout = service.layout();
    evaluation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/progress-layout",
            axum::routing::get(move || async move {
                Json(json!({ "layout": layout, "steps": layout.step_labels() }))
            }),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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
