//! Staff evaluation lifecycle: status progression, role-gated sections, grading,
//! progress and deadline derivations, and the service that persists stage writes.
//!
//! The pure modules (`gates`, `grading`, `progress`, `deadlines`, `navigation`) take
//! role, status, ratings and the current time as explicit arguments and hold no
//! state, so page, form and sidebar call sites all consult the same rules.

pub mod deadlines;
pub mod domain;
pub mod gates;
pub mod grading;
pub mod navigation;
pub mod progress;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use deadlines::{DeadlineSettings, DeadlineStatus};
pub use domain::{
    DirectorReview, EmployeeId, Evaluation, EvaluationId, EvaluationSection, EvaluationStatus,
    HrRatings, HrReview, LeadRatings, LeadReview, LetterGrade, Permission, Rating, RatingError,
    Role, SelfEvaluation, Stage,
};
pub use gates::{section_access, EditGate, SectionAccess, SectionAccessEntry, SectionVisibility};
pub use grading::{suggest_final_grade, GradeBreakdown};
pub use navigation::{navigation_for, NavItem};
pub use progress::{progress_rail, step_index, ProgressLayout, ProgressStep, StepState};
pub use report::EvaluationReport;
pub use repository::{
    EvaluationFilter, EvaluationRepository, EvaluationSummaryView, NotificationError,
    NotificationPublisher, RepositoryError, StageNotification,
};
pub use router::{evaluation_router, ROLE_HEADER};
pub use service::{
    CreateEvaluation, EvaluationAccess, EvaluationService, EvaluationServiceError,
    StageSubmission,
};
pub use validation::{
    DirectorReviewInput, FieldError, GradeSuggestionInput, HrReviewInput, LeadReviewInput,
    SelfEvaluationInput, StageInput,
};
