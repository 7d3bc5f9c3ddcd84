use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use staff_eval::workflows::evaluation::{
    evaluation_router, CreateEvaluation, EmployeeId, Evaluation, EvaluationFilter, EvaluationId,
    EvaluationRepository, EvaluationService, EvaluationStatus, LetterGrade, NotificationError,
    NotificationPublisher, ProgressLayout, RepositoryError, Role, SelfEvaluationInput,
    StageNotification, ROLE_HEADER,
};
use tower::ServiceExt;

#[derive(Default)]
struct SharedRepository {
    records: Mutex<HashMap<EvaluationId, Evaluation>>,
}

impl EvaluationRepository for SharedRepository {
    fn insert(&self, record: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: Evaluation,
        expected: EvaluationStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) if existing.status == expected => {
                *existing = record;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct Inbox {
    sent: Mutex<Vec<StageNotification>>,
}

impl NotificationPublisher for Inbox {
    fn publish(&self, notification: StageNotification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("inbox mutex poisoned")
            .push(notification);
        Ok(())
    }
}

fn service() -> (Arc<EvaluationService<SharedRepository, Inbox>>, Arc<Inbox>) {
    let inbox = Arc::new(Inbox::default());
    let service = EvaluationService::new(
        Arc::new(SharedRepository::default()),
        inbox.clone(),
        ProgressLayout::FoldedHr,
    );
    (Arc::new(service), inbox)
}

async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    role: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(ROLE_HEADER, role)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request");
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json payload")
    };
    (status, payload)
}

#[tokio::test]
async fn evaluation_moves_from_staff_to_director_over_http() {
    let (service, inbox) = service();
    let router = evaluation_router(service.clone());

    let (status, created) = send(
        &router,
        "POST",
        "/api/v1/evaluations",
        "STAFF",
        Some(json!({
            "employee": "emp-042",
            "period": "FY2024 H1",
            "self_evaluation": {
                "self_grade": "B+",
                "achievements": "Rolled out the new onboarding flow",
                "goals": "Lead the payments rewrite"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("id").to_string();
    let stages = format!("/api/v1/evaluations/{id}/stages");

    let (status, lead) = send(
        &router,
        "POST",
        &stages,
        "LEAD",
        Some(json!({
            "expected_status": "SUBMITTED_BY_STAFF",
            "stage": { "section": "lead_review", "performance": 4, "teamwork": 3, "leadership": 2 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lead["status"], "REVIEWED_BY_LEAD");

    let (status, hr) = send(
        &router,
        "POST",
        &stages,
        "HR",
        Some(json!({
            "stage": { "section": "hr_review", "attendance": 5, "compliance": 4 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hr["status"], "PENDING_DIRECTOR_REVIEW");

    let (status, suggestion) = send(
        &router,
        "GET",
        &format!("/api/v1/evaluations/{id}/grade-suggestion"),
        "DIRECTOR",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(suggestion["suggested"], "B+");

    let (status, done) = send(
        &router,
        "POST",
        &stages,
        "DIRECTOR",
        Some(json!({
            "stage": { "section": "director_review", "final_grade": "A", "comments": "Promote" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");
    assert_eq!(done["director_review"]["final_grade"], "A");
    assert!(done["completed_at"].is_string());

    let (status, again) = send(
        &router,
        "POST",
        &stages,
        "DIRECTOR",
        Some(json!({
            "stage": { "section": "director_review", "final_grade": "F" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["retryable"], false);

    let stored = service
        .get(&EvaluationId(id.clone()), Some(Role::Admin))
        .expect("stored evaluation");
    assert_eq!(stored.final_grade(), Some(LetterGrade::A));
    assert_eq!(inbox.sent.lock().expect("inbox").len(), 4);

    let (status, report) = send(&router, "GET", "/api/v1/reports/FY2024%20H1", "ADMIN", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 1);
    assert_eq!(report["completion_pct"], 100.0);
}

#[test]
fn service_api_alone_drives_the_lifecycle() {
    let (service, _) = service();
    let created_at = Utc
        .with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp");

    let record = service
        .create(
            CreateEvaluation {
                employee: EmployeeId("emp-7".to_string()),
                period: "FY2024 H1".to_string(),
                self_evaluation: Some(SelfEvaluationInput {
                    self_grade: "C".to_string(),
                    achievements: "Closed the audit findings".to_string(),
                    challenges: String::new(),
                    goals: String::new(),
                }),
            },
            Some(Role::Staff),
            created_at,
        )
        .expect("created");
    assert_eq!(record.status, EvaluationStatus::SubmittedByStaff);
    assert_eq!(record.created_at, created_at);

    let morning = NaiveDate::from_ymd_opt(2024, 3, 2)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .expect("valid time");
    let access = service
        .access(&record.id, Some(Role::Staff), morning)
        .expect("access");
    assert_eq!(access.gate.editable_section(), None);
    assert!(!access.visibility.show_director);
}
