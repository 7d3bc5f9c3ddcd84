use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::deadlines::{DeadlineSettings, DeadlineStatus};
use super::domain::{
    EmployeeId, Evaluation, EvaluationId, EvaluationSection, EvaluationStatus, Permission, Role,
    Stage,
};
use super::gates::{section_access, EditGate, SectionAccessEntry, SectionVisibility};
use super::grading::GradeBreakdown;
use super::progress::{progress_rail, step_index, ProgressLayout, ProgressStep};
use super::report::EvaluationReport;
use super::repository::{
    EvaluationFilter, EvaluationRepository, NotificationPublisher, RepositoryError,
    StageNotification,
};
use super::validation::{summarize, FieldError, SelfEvaluationInput, StageInput, ValidatedStage};

/// Request to open an evaluation. Staff may include their self evaluation so the
/// record is created and submitted in one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvaluation {
    pub employee: EmployeeId,
    pub period: String,
    #[serde(default)]
    pub self_evaluation: Option<SelfEvaluationInput>,
}

/// One stage write. `expected_status` is the status the caller's form was
/// rendered against; a mismatch means the form is stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSubmission {
    #[serde(default)]
    pub expected_status: Option<EvaluationStatus>,
    pub stage: StageInput,
}

/// Everything a view needs to render one evaluation for one actor.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationAccess {
    pub evaluation_id: EvaluationId,
    pub role: Option<Role>,
    pub status: EvaluationStatus,
    pub gate: EditGate,
    pub visibility: SectionVisibility,
    pub sections: Vec<SectionAccessEntry>,
    pub layout: ProgressLayout,
    pub step_index: usize,
    pub progress: Vec<ProgressStep>,
    pub deadline: DeadlineStatus,
}

/// Service owning the evaluation lifecycle: it is the only writer of `status`.
pub struct EvaluationService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    layout: ProgressLayout,
    deadlines: RwLock<DeadlineSettings>,
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

impl<R, N> EvaluationService<R, N>
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, layout: ProgressLayout) -> Self {
        Self {
            repository,
            notifications,
            layout,
            deadlines: RwLock::new(DeadlineSettings::default()),
        }
    }

    pub fn with_deadlines(self, deadlines: DeadlineSettings) -> Self {
        Self {
            deadlines: RwLock::new(deadlines),
            ..self
        }
    }

    pub fn layout(&self) -> ProgressLayout {
        self.layout
    }

    /// Open a new evaluation in `PENDING_STAFF`, or straight into
    /// `SUBMITTED_BY_STAFF` when the self evaluation is included.
    pub fn create(
        &self,
        request: CreateEvaluation,
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, EvaluationServiceError> {
        require(role, Permission::SubmitSelfEvaluation, "create evaluations")?;

        let period = request.period.trim();
        if period.is_empty() {
            return Err(EvaluationServiceError::Validation(vec![FieldError::new(
                "period",
                "must not be empty",
            )]));
        }

        let mut record = Evaluation::new(next_evaluation_id(), request.employee, period, now);

        if let Some(input) = request.self_evaluation {
            let gate = EditGate::resolve(role, record.status, true);
            if !gate.can_edit_self {
                return Err(EvaluationServiceError::GateClosed {
                    section: EvaluationSection::SelfEvaluation,
                    status: record.status,
                });
            }
            let stage = StageInput::SelfEvaluation(input)
                .validate()
                .map_err(EvaluationServiceError::Validation)?;
            write_stage(&mut record, stage, now)?;
        }

        let stored = self.repository.insert(record)?;
        info!(
            evaluation_id = %stored.id,
            period = %stored.period,
            status = %stored.status,
            "evaluation created"
        );

        if stored.status != EvaluationStatus::PendingStaff {
            self.notify(&stored, EvaluationSection::SelfEvaluation);
        }

        Ok(stored)
    }

    /// Write one section and advance the status. The gate is resolved against the
    /// freshly fetched record, so a repeated or stale submission is rejected, and
    /// the write only lands if the stored status is still the one the gate saw.
    pub fn submit_stage(
        &self,
        evaluation_id: &EvaluationId,
        role: Option<Role>,
        submission: StageSubmission,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let mut record = self.load(evaluation_id)?;

        if let Some(expected) = submission.expected_status {
            if expected != record.status {
                warn!(
                    evaluation_id = %record.id,
                    expected = %expected,
                    actual = %record.status,
                    "rejecting stale stage submission"
                );
                return Err(EvaluationServiceError::StaleStatus {
                    expected,
                    actual: record.status,
                });
            }
        }

        let section = submission.stage.section();
        let gate = EditGate::resolve(role, record.status, false);
        if !gate.can_edit(section) {
            warn!(
                evaluation_id = %record.id,
                section = section.label(),
                status = %record.status,
                role = ?role,
                "edit gate closed"
            );
            return Err(EvaluationServiceError::GateClosed {
                section,
                status: record.status,
            });
        }

        if record.section_written(section) {
            return Err(EvaluationServiceError::AlreadyWritten(section));
        }

        let stage = submission
            .stage
            .validate()
            .map_err(EvaluationServiceError::Validation)?;
        let fetched_status = record.status;
        write_stage(&mut record, stage, now)?;

        if let Err(err) = self.repository.update(record.clone(), fetched_status) {
            if matches!(err, RepositoryError::Conflict) {
                warn!(
                    evaluation_id = %record.id,
                    section = section.label(),
                    expected = %fetched_status,
                    "stage write lost to a concurrent submission"
                );
            }
            return Err(err.into());
        }
        info!(
            evaluation_id = %record.id,
            section = section.label(),
            status = %record.status,
            "evaluation stage submitted"
        );
        self.notify(&record, section);

        Ok(record)
    }

    /// Fetch an evaluation for API responses, with sections the actor may not
    /// see cleared to `Unwritten`.
    pub fn get(
        &self,
        evaluation_id: &EvaluationId,
        role: Option<Role>,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let role = require_viewer(role)?;
        let record = self.load(evaluation_id)?;
        Ok(visible_to(record, role))
    }

    pub fn list(
        &self,
        filter: &EvaluationFilter,
        role: Option<Role>,
    ) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        let role = require_viewer(role)?;
        Ok(self
            .records(filter)?
            .into_iter()
            .map(|record| visible_to(record, role))
            .collect())
    }

    pub fn access(
        &self,
        evaluation_id: &EvaluationId,
        role: Option<Role>,
        now: NaiveDateTime,
    ) -> Result<EvaluationAccess, EvaluationServiceError> {
        let record = self.load(evaluation_id)?;
        let deadlines = self.deadlines();

        Ok(EvaluationAccess {
            evaluation_id: record.id,
            role,
            status: record.status,
            gate: EditGate::resolve(role, record.status, false),
            visibility: SectionVisibility::resolve(role, record.status),
            sections: section_access(role, record.status, false),
            layout: self.layout,
            step_index: step_index(record.status, self.layout),
            progress: progress_rail(record.status, self.layout),
            deadline: DeadlineStatus::for_role(role, &deadlines, now),
        })
    }

    /// Pre-fill value for the director's final grade. Requires the self, lead and
    /// HR sections to exist; the director remains free to submit another grade.
    pub fn grade_suggestion(
        &self,
        evaluation_id: &EvaluationId,
        role: Option<Role>,
    ) -> Result<GradeBreakdown, EvaluationServiceError> {
        require(role, Permission::ReviewAsDirector, "request grade suggestions")?;
        let record = self.load(evaluation_id)?;

        match (
            record.self_evaluation.as_written(),
            record.lead_review.as_written(),
            record.hr_review.as_written(),
        ) {
            (Some(self_eval), Some(lead), Some(hr)) => Ok(GradeBreakdown::compute(
                self_eval.self_grade,
                &lead.ratings,
                &hr.ratings,
            )),
            _ => {
                let missing = [
                    EvaluationSection::SelfEvaluation,
                    EvaluationSection::LeadReview,
                    EvaluationSection::HrReview,
                ]
                .into_iter()
                .filter(|section| !record.section_written(*section))
                .collect();
                Err(EvaluationServiceError::IncompleteReviews(missing))
            }
        }
    }

    pub fn deadlines(&self) -> DeadlineSettings {
        self.deadlines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_deadlines(
        &self,
        role: Option<Role>,
        settings: DeadlineSettings,
    ) -> Result<DeadlineSettings, EvaluationServiceError> {
        require(role, Permission::ManageSettings, "change deadlines")?;
        let mut guard = self
            .deadlines
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = settings.clone();
        info!(?settings, "evaluation deadlines updated");
        Ok(settings)
    }

    pub fn report(
        &self,
        role: Option<Role>,
        period: &str,
        now: NaiveDateTime,
    ) -> Result<EvaluationReport, EvaluationServiceError> {
        require(role, Permission::ViewReports, "view reports")?;
        let records = self.records(&EvaluationFilter::for_period(period))?;
        Ok(EvaluationReport::build(
            period,
            &records,
            &self.deadlines(),
            now,
        ))
    }

    fn load(&self, evaluation_id: &EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        let record = self
            .repository
            .fetch(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn records(&self, filter: &EvaluationFilter) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        let mut records = self.repository.list(filter)?;
        records.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(records)
    }

    fn notify(&self, record: &Evaluation, section: EvaluationSection) {
        let notification = StageNotification::for_submission(record, section);
        if let Err(err) = self.notifications.publish(notification) {
            warn!(evaluation_id = %record.id, error = %err, "stage notification failed");
        }
    }
}

fn require(
    role: Option<Role>,
    permission: Permission,
    action: &'static str,
) -> Result<Role, EvaluationServiceError> {
    match role {
        Some(role) if role.has_permission(permission) => Ok(role),
        _ => Err(EvaluationServiceError::Forbidden { action }),
    }
}

fn require_viewer(role: Option<Role>) -> Result<Role, EvaluationServiceError> {
    let viewer = role.filter(|role| {
        [
            Permission::ViewOwnEvaluations,
            Permission::ViewTeamEvaluations,
            Permission::ViewAllEvaluations,
        ]
        .into_iter()
        .any(|permission| role.has_permission(permission))
    });
    viewer.ok_or(EvaluationServiceError::Forbidden {
        action: "view evaluations",
    })
}

fn visible_to(record: Evaluation, role: Role) -> Evaluation {
    let visibility = SectionVisibility::resolve(Some(role), record.status);
    visibility.redact(record)
}

fn write_stage(
    record: &mut Evaluation,
    stage: ValidatedStage,
    now: DateTime<Utc>,
) -> Result<(), EvaluationServiceError> {
    let next = stage.section().status_after_submit();
    if !record.status.can_advance_to(next) {
        return Err(EvaluationServiceError::InvalidTransition {
            current: record.status,
            next,
        });
    }

    match stage {
        ValidatedStage::SelfEvaluation(value) => {
            record.self_evaluation = Stage::Written(value);
            record.submitted_at = Some(now);
        }
        ValidatedStage::LeadReview(value) => {
            record.lead_review = Stage::Written(value);
            record.lead_reviewed_at = Some(now);
        }
        ValidatedStage::HrReview(value) => {
            record.hr_review = Stage::Written(value);
            record.hr_reviewed_at = Some(now);
        }
        ValidatedStage::DirectorReview(value) => {
            record.director_review = Stage::Written(value);
            record.director_reviewed_at = Some(now);
            record.completed_at = Some(now);
        }
    }

    record.status = next;
    Ok(())
}

fn section_labels(sections: &[EvaluationSection]) -> String {
    sections
        .iter()
        .map(|section| section.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised by the evaluation service. None of these leave a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("actor is not permitted to {action}")]
    Forbidden { action: &'static str },
    #[error("{} is not editable while the evaluation is {status}", .section.label())]
    GateClosed {
        section: EvaluationSection,
        status: EvaluationStatus,
    },
    #[error("evaluation is {actual}, not {expected}; reload before submitting")]
    StaleStatus {
        expected: EvaluationStatus,
        actual: EvaluationStatus,
    },
    #[error("{} has already been written", .0.label())]
    AlreadyWritten(EvaluationSection),
    #[error("cannot move evaluation from {current} to {next}")]
    InvalidTransition {
        current: EvaluationStatus,
        next: EvaluationStatus,
    },
    #[error("invalid submission: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("grade suggestion needs: {}", section_labels(.0))]
    IncompleteReviews(Vec<EvaluationSection>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
