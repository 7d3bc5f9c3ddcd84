use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;

use super::deadlines::DeadlineSettings;
use super::domain::{EvaluationId, EvaluationStatus, Role};
use super::grading::GradeBreakdown;
use super::navigation::navigation_for;
use super::repository::{
    EvaluationFilter, EvaluationRepository, EvaluationSummaryView, NotificationPublisher,
    RepositoryError,
};
use super::service::{CreateEvaluation, EvaluationService, EvaluationServiceError, StageSubmission};
use super::validation::GradeSuggestionInput;

/// Header carrying the acting role, as resolved by the upstream identity layer.
pub const ROLE_HEADER: &str = "x-staff-role";

/// Router builder exposing the evaluation workflow over HTTP.
pub fn evaluation_router<R, N>(service: Arc<EvaluationService<R, N>>) -> Router
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/evaluations",
            post(create_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/evaluations/:evaluation_id", get(get_handler::<R, N>))
        .route(
            "/api/v1/evaluations/:evaluation_id/access",
            get(access_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/stages",
            post(submit_stage_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/grade-suggestion",
            get(grade_suggestion_handler::<R, N>),
        )
        .route("/api/v1/grades/suggest", post(suggest_grade_handler))
        .route("/api/v1/navigation", get(navigation_handler))
        .route(
            "/api/v1/settings/deadlines",
            get(deadlines_handler::<R, N>).put(update_deadlines_handler::<R, N>),
        )
        .route("/api/v1/reports/:period", get(report_handler::<R, N>))
        .route("/api/v1/reports/:period/csv", get(report_csv_handler::<R, N>))
        .with_state(service)
}

pub(crate) fn actor_role(headers: &HeaderMap) -> Option<Role> {
    headers
        .get(ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse)
}

pub(crate) fn error_response(error: EvaluationServiceError) -> Response {
    let status = match &error {
        EvaluationServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        EvaluationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationServiceError::GateClosed { .. }
        | EvaluationServiceError::StaleStatus { .. }
        | EvaluationServiceError::AlreadyWritten(_)
        | EvaluationServiceError::InvalidTransition { .. }
        | EvaluationServiceError::IncompleteReviews(_) => StatusCode::CONFLICT,
        EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let mut payload = json!({
        "error": error.to_string(),
        "retryable": status == StatusCode::SERVICE_UNAVAILABLE,
    });
    if let EvaluationServiceError::Validation(fields) = &error {
        payload["fields"] = json!(fields);
    }

    (status, Json(payload)).into_response()
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Json(request): Json<CreateEvaluation>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create(request, actor_role(&headers), Utc::now()) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let status = match query.status.as_deref().map(str::parse::<EvaluationStatus>) {
        Some(Ok(status)) => Some(status),
        Some(Err(err)) => {
            let payload = json!({ "error": err.to_string(), "retryable": false });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
        None => None,
    };

    let filter = EvaluationFilter {
        period: query.period,
        status,
    };

    match service.list(&filter, actor_role(&headers)) {
        Ok(records) => {
            let views: Vec<EvaluationSummaryView> =
                records.iter().map(EvaluationSummaryView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&EvaluationId(evaluation_id), actor_role(&headers)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn access_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let now = Local::now().naive_local();
    match service.access(&EvaluationId(evaluation_id), actor_role(&headers), now) {
        Ok(access) => (StatusCode::OK, Json(access)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_stage_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(evaluation_id): Path<String>,
    Json(submission): Json<StageSubmission>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service.submit_stage(&id, actor_role(&headers), submission, Utc::now()) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn grade_suggestion_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service.grade_suggestion(&id, actor_role(&headers)) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn suggest_grade_handler(Json(input): Json<GradeSuggestionInput>) -> Response {
    match input.validate() {
        Ok((self_grade, lead, hr)) => {
            let breakdown = GradeBreakdown::compute(self_grade, &lead, &hr);
            (StatusCode::OK, Json(breakdown)).into_response()
        }
        Err(fields) => error_response(EvaluationServiceError::Validation(fields)),
    }
}

pub(crate) async fn navigation_handler(headers: HeaderMap) -> Response {
    let items: Vec<_> = navigation_for(actor_role(&headers))
        .into_iter()
        .map(|item| json!({ "item": item, "label": item.label() }))
        .collect();
    (StatusCode::OK, Json(items)).into_response()
}

pub(crate) async fn deadlines_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    (StatusCode::OK, Json(service.deadlines())).into_response()
}

pub(crate) async fn update_deadlines_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Json(settings): Json<DeadlineSettings>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update_deadlines(actor_role(&headers), settings) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(period): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let now = Local::now().naive_local();
    match service.report(actor_role(&headers), &period, now) {
        Ok(report) => (StatusCode::OK, Json(report.summary())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_csv_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    Path(period): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let now = Local::now().naive_local();
    let report = match service.report(actor_role(&headers), &period, now) {
        Ok(report) => report,
        Err(error) => return error_response(error),
    };

    match report.to_csv_string() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string(), "retryable": true });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
