use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::evaluation::domain::{
    EmployeeId, Evaluation, EvaluationId, EvaluationStatus, Role,
};
use crate::workflows::evaluation::repository::{
    EvaluationFilter, EvaluationRepository, NotificationError, NotificationPublisher,
    RepositoryError, StageNotification,
};
use crate::workflows::evaluation::validation::{
    DirectorReviewInput, HrReviewInput, LeadReviewInput, SelfEvaluationInput, StageInput,
};
use crate::workflows::evaluation::{
    evaluation_router, CreateEvaluation, EvaluationService, ProgressLayout, StageSubmission,
};

pub(super) const PERIOD: &str = "Q3 2023";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 9, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn wall_clock(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 9, day)
        .expect("valid date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}

pub(super) fn create_request(employee: &str) -> CreateEvaluation {
    CreateEvaluation {
        employee: EmployeeId(employee.to_string()),
        period: PERIOD.to_string(),
        self_evaluation: None,
    }
}

pub(super) fn self_input(grade: &str) -> SelfEvaluationInput {
    SelfEvaluationInput {
        self_grade: grade.to_string(),
        achievements: "Shipped the billing migration".to_string(),
        challenges: "On-call load".to_string(),
        goals: "Mentor two new hires".to_string(),
    }
}

pub(super) fn lead_input(performance: i64, teamwork: i64, leadership: i64) -> StageInput {
    StageInput::LeadReview(LeadReviewInput {
        performance,
        teamwork,
        leadership,
        comments: "Reliable delivery".to_string(),
    })
}

pub(super) fn hr_input(attendance: i64, compliance: i64) -> StageInput {
    StageInput::HrReview(HrReviewInput {
        attendance,
        compliance,
        comments: "No incidents".to_string(),
    })
}

pub(super) fn director_input(grade: &str) -> StageInput {
    StageInput::DirectorReview(DirectorReviewInput {
        final_grade: grade.to_string(),
        comments: "Agreed".to_string(),
    })
}

pub(super) fn submission(stage: StageInput) -> StageSubmission {
    StageSubmission {
        expected_status: None,
        stage,
    }
}

pub(super) type TestService = EvaluationService<MemoryRepository, MemoryNotifications>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = EvaluationService::new(
        repository.clone(),
        notifications.clone(),
        ProgressLayout::FoldedHr,
    );
    (service, repository, notifications)
}

/// Creates an evaluation and drives it through `stages` reviewer submissions
/// (0 = pending staff, 4 = completed).
pub(super) fn evaluation_after(service: &TestService, stages: usize) -> Evaluation {
    let mut record = service
        .create(create_request("emp-100"), Some(Role::Staff), now())
        .expect("staff can create");

    let steps: Vec<(Role, StageInput)> = vec![
        (Role::Staff, StageInput::SelfEvaluation(self_input("B+"))),
        (Role::Lead, lead_input(4, 4, 3)),
        (Role::Hr, hr_input(5, 4)),
        (Role::Director, director_input("B+")),
    ];

    for (role, stage) in steps.into_iter().take(stages) {
        record = service
            .submit_stage(&record.id, Some(role), submission(stage), now())
            .expect("stage accepted");
    }

    record
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<EvaluationId, Evaluation>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &EvaluationId) -> Evaluation {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("record present")
    }
}

impl EvaluationRepository for MemoryRepository {
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

/// Holds every `fetch` until `parties` callers have read the record, so each
/// of them decides against the same snapshot before anyone writes.
pub(super) struct RendezvousRepository {
    inner: MemoryRepository,
    barrier: Barrier,
}

impl RendezvousRepository {
    pub(super) fn new(inner: MemoryRepository, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

impl EvaluationRepository for RendezvousRepository {
    fn insert(&self, record: Evaluation) -> Result<Evaluation, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(
        &self,
        record: Evaluation,
        expected: EvaluationStatus,
    ) -> Result<(), RepositoryError> {
        self.inner.update(record, expected)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        let record = self.inner.fetch(id)?;
        self.barrier.wait();
        Ok(record)
    }

    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<Evaluation>, RepositoryError> {
        self.inner.list(filter)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<StageNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<StageNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: StageNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: StageNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn insert(&self, _record: Evaluation) -> Result<Evaluation, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _record: Evaluation,
        _expected: EvaluationStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &EvaluationFilter) -> Result<Vec<Evaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    evaluation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
