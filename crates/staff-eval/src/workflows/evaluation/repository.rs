use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    EmployeeId, Evaluation, EvaluationId, EvaluationSection, EvaluationStatus, LetterGrade, Role,
};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, record: Evaluation) -> Result<Evaluation, RepositoryError>;
    /// Replaces the stored record only while its status is still `expected`;
    /// otherwise returns [`RepositoryError::Conflict`] and leaves it untouched.
    /// The check and the write must happen under one lock or transaction.
    fn update(
        &self,
        record: Evaluation,
        expected: EvaluationStatus,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<Evaluation>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was changed by another request")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Optional narrowing applied when listing evaluations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFilter {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub status: Option<EvaluationStatus>,
}

impl EvaluationFilter {
    pub fn for_period(period: impl Into<String>) -> Self {
        Self {
            period: Some(period.into()),
            status: None,
        }
    }

    pub fn matches(&self, record: &Evaluation) -> bool {
        let period_ok = self
            .period
            .as_deref()
            .map(|period| record.period == period)
            .unwrap_or(true);
        let status_ok = self
            .status
            .map(|status| record.status == status)
            .unwrap_or(true);
        period_ok && status_ok
    }
}

/// Outbound hook fired when a stage is submitted (e-mail, chat, inbox adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: StageNotification) -> Result<(), NotificationError>;
}

/// Payload telling the next reviewer that an evaluation is waiting on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNotification {
    pub template: String,
    pub evaluation_id: EvaluationId,
    /// Role expected to act next; `None` once the evaluation is completed.
    pub recipient_role: Option<Role>,
    pub details: BTreeMap<String, String>,
}

impl StageNotification {
    pub fn for_submission(record: &Evaluation, section: EvaluationSection) -> Self {
        let recipient_role = match record.status {
            EvaluationStatus::SubmittedByStaff => Some(Role::Lead),
            EvaluationStatus::ReviewedByLead => Some(Role::Hr),
            EvaluationStatus::ReviewedByHr | EvaluationStatus::PendingDirectorReview => {
                Some(Role::Director)
            }
            EvaluationStatus::PendingStaff => Some(Role::Staff),
            EvaluationStatus::Completed => None,
        };

        let mut details = BTreeMap::new();
        details.insert("section".to_string(), section.label().to_string());
        details.insert("status".to_string(), record.status.as_str().to_string());
        details.insert("period".to_string(), record.period.clone());
        details.insert("employee".to_string(), record.employee.0.clone());

        let template = if record.is_completed() {
            "evaluation_completed"
        } else {
            "evaluation_stage_submitted"
        };

        Self {
            template: template.to_string(),
            evaluation_id: record.id.clone(),
            recipient_role,
            details,
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Compact listing row for evaluation tables.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummaryView {
    pub evaluation_id: EvaluationId,
    pub employee: EmployeeId,
    pub period: String,
    pub status: EvaluationStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_grade: Option<LetterGrade>,
}

impl From<&Evaluation> for EvaluationSummaryView {
    fn from(record: &Evaluation) -> Self {
        Self {
            evaluation_id: record.id.clone(),
            employee: record.employee.clone(),
            period: record.period.clone(),
            status: record.status,
            status_label: record.status.label(),
            final_grade: record.final_grade(),
        }
    }
}
