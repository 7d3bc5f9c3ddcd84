use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for evaluation records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the staff member being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

/// Lifecycle states of an evaluation, in the only order they may be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    PendingStaff,
    SubmittedByStaff,
    ReviewedByLead,
    ReviewedByHr,
    PendingDirectorReview,
    Completed,
}

impl EvaluationStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::PendingStaff,
            Self::SubmittedByStaff,
            Self::ReviewedByLead,
            Self::ReviewedByHr,
            Self::PendingDirectorReview,
            Self::Completed,
        ]
    }

    pub const fn ordinal(self) -> u8 {
        match self {
            Self::PendingStaff => 0,
            Self::SubmittedByStaff => 1,
            Self::ReviewedByLead => 2,
            Self::ReviewedByHr => 3,
            Self::PendingDirectorReview => 4,
            Self::Completed => 5,
        }
    }

    /// Forward-only: there is no transition back to an earlier state.
    pub const fn can_advance_to(self, next: Self) -> bool {
        next.ordinal() > self.ordinal()
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingStaff => "PENDING_STAFF",
            Self::SubmittedByStaff => "SUBMITTED_BY_STAFF",
            Self::ReviewedByLead => "REVIEWED_BY_LEAD",
            Self::ReviewedByHr => "REVIEWED_BY_HR",
            Self::PendingDirectorReview => "PENDING_DIRECTOR_REVIEW",
            Self::Completed => "COMPLETED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingStaff => "Pending Staff",
            Self::SubmittedByStaff => "Submitted by Staff",
            Self::ReviewedByLead => "Reviewed by Lead",
            Self::ReviewedByHr => "Reviewed by HR",
            Self::PendingDirectorReview => "Pending Director Review",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStatus {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown evaluation status '{0}'")]
pub struct ParseStatusError(pub String);

/// Actor roles. Each account holds exactly one, assigned outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Staff,
    Lead,
    Hr,
    Director,
    Admin,
}

impl Role {
    pub const fn ordered() -> [Self; 5] {
        [Self::Staff, Self::Lead, Self::Hr, Self::Director, Self::Admin]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "STAFF",
            Self::Lead => "LEAD",
            Self::Hr => "HR",
            Self::Director => "DIRECTOR",
            Self::Admin => "ADMIN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Lead => "Team Lead",
            Self::Hr => "HR",
            Self::Director => "Director",
            Self::Admin => "Administrator",
        }
    }

    /// Lenient parse used at request boundaries; unknown input yields `None`,
    /// which every consumer treats as "no rights".
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Staff => &[
                Permission::SubmitSelfEvaluation,
                Permission::ViewOwnEvaluations,
            ],
            Self::Lead => &[Permission::ReviewAsLead, Permission::ViewTeamEvaluations],
            Self::Hr => &[Permission::ReviewAsHr, Permission::ViewAllEvaluations],
            Self::Director => &[
                Permission::ReviewAsDirector,
                Permission::ViewAllEvaluations,
                Permission::ViewReports,
            ],
            Self::Admin => &[
                Permission::ViewAllEvaluations,
                Permission::ManageUsers,
                Permission::ManageTeams,
                Permission::ManagePeriods,
                Permission::ManageSettings,
                Permission::ViewReports,
            ],
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ParseRoleError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct ParseRoleError(pub String);

/// Capabilities granted by the static role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SubmitSelfEvaluation,
    ViewOwnEvaluations,
    ReviewAsLead,
    ViewTeamEvaluations,
    ReviewAsHr,
    ReviewAsDirector,
    ViewAllEvaluations,
    ViewReports,
    ManageUsers,
    ManageTeams,
    ManagePeriods,
    ManageSettings,
}

/// Letter grades, declared from lowest to highest so `Ord` follows merit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A")]
    A,
}

impl LetterGrade {
    /// Highest grade first, matching how grade pickers list them.
    pub const fn ordered() -> [Self; 6] {
        [
            Self::A,
            Self::BPlus,
            Self::BMinus,
            Self::C,
            Self::D,
            Self::F,
        ]
    }

    pub const fn points(self) -> f64 {
        match self {
            Self::A => 4.0,
            Self::BPlus => 3.5,
            Self::BMinus => 2.8,
            Self::C => 2.0,
            Self::D => 1.0,
            Self::F => 0.0,
        }
    }

    pub fn from_composite(composite: f64) -> Self {
        if composite >= 3.7 {
            Self::A
        } else if composite >= 3.3 {
            Self::BPlus
        } else if composite >= 2.7 {
            Self::BMinus
        } else if composite >= 2.0 {
            Self::C
        } else if composite >= 1.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::BPlus => "B+",
            Self::BMinus => "B-",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = ParseGradeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|grade| grade.as_str() == normalized)
            .ok_or_else(|| ParseGradeError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not one of A, B+, B-, C, D, F")]
pub struct ParseGradeError(pub String);

/// Likert-style score. Zero is the unrated placeholder, 1-5 are real scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;
    pub const UNRATED: Rating = Rating(0);

    pub fn new(value: u8) -> Result<Self, RatingError> {
        if value > Self::MAX {
            return Err(RatingError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_unrated(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("rating {0} is outside 0-5")]
    OutOfRange(u8),
}

/// A section that is either not yet written or written once by its owning role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<T>", into = "Option<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub enum Stage<T> {
    Unwritten,
    Written(T),
}

impl<T> Stage<T> {
    pub const fn is_written(&self) -> bool {
        matches!(self, Stage::Written(_))
    }

    pub fn as_written(&self) -> Option<&T> {
        match self {
            Stage::Written(value) => Some(value),
            Stage::Unwritten => None,
        }
    }

    pub fn into_written(self) -> Option<T> {
        match self {
            Stage::Written(value) => Some(value),
            Stage::Unwritten => None,
        }
    }
}

impl<T> Default for Stage<T> {
    fn default() -> Self {
        Stage::Unwritten
    }
}

impl<T> From<Option<T>> for Stage<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => Stage::Written(inner),
            None => Stage::Unwritten,
        }
    }
}

impl<T> From<Stage<T>> for Option<T> {
    fn from(value: Stage<T>) -> Self {
        value.into_written()
    }
}

/// Staff-authored part of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfEvaluation {
    pub self_grade: LetterGrade,
    pub achievements: String,
    pub challenges: String,
    pub goals: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRatings {
    pub performance: Rating,
    pub teamwork: Rating,
    pub leadership: Rating,
}

impl LeadRatings {
    pub fn values(&self) -> [Rating; 3] {
        [self.performance, self.teamwork, self.leadership]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadReview {
    pub ratings: LeadRatings,
    pub comments: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrRatings {
    pub attendance: Rating,
    pub compliance: Rating,
}

impl HrRatings {
    pub fn values(&self) -> [Rating; 2] {
        [self.attendance, self.compliance]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrReview {
    pub ratings: HrRatings,
    pub comments: String,
}

/// Director sign-off; `final_grade` may differ from the suggested grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorReview {
    pub final_grade: LetterGrade,
    pub comments: String,
}

/// The four sections of an evaluation, each owned by exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSection {
    SelfEvaluation,
    LeadReview,
    HrReview,
    DirectorReview,
}

impl EvaluationSection {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::SelfEvaluation,
            Self::LeadReview,
            Self::HrReview,
            Self::DirectorReview,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SelfEvaluation => "Self Evaluation",
            Self::LeadReview => "Team Lead Review",
            Self::HrReview => "HR Review",
            Self::DirectorReview => "Director Review",
        }
    }

    pub const fn author(self) -> Role {
        match self {
            Self::SelfEvaluation => Role::Staff,
            Self::LeadReview => Role::Lead,
            Self::HrReview => Role::Hr,
            Self::DirectorReview => Role::Director,
        }
    }

    /// Status in which the section's author may write it.
    pub const fn open_status(self) -> EvaluationStatus {
        match self {
            Self::SelfEvaluation => EvaluationStatus::PendingStaff,
            Self::LeadReview => EvaluationStatus::SubmittedByStaff,
            Self::HrReview => EvaluationStatus::ReviewedByLead,
            Self::DirectorReview => EvaluationStatus::PendingDirectorReview,
        }
    }

    /// Status the record moves to once the section is submitted.
    pub const fn status_after_submit(self) -> EvaluationStatus {
        match self {
            Self::SelfEvaluation => EvaluationStatus::SubmittedByStaff,
            Self::LeadReview => EvaluationStatus::ReviewedByLead,
            Self::HrReview => EvaluationStatus::PendingDirectorReview,
            Self::DirectorReview => EvaluationStatus::Completed,
        }
    }
}

/// Aggregate threading through the review workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub employee: EmployeeId,
    pub period: String,
    pub status: EvaluationStatus,
    #[serde(default)]
    pub self_evaluation: Stage<SelfEvaluation>,
    #[serde(default)]
    pub lead_review: Stage<LeadReview>,
    #[serde(default)]
    pub hr_review: Stage<HrReview>,
    #[serde(default)]
    pub director_review: Stage<DirectorReview>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lead_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hr_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub director_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// Fresh record awaiting the staff member's self evaluation.
    pub fn new(
        id: EvaluationId,
        employee: EmployeeId,
        period: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            employee,
            period: period.into(),
            status: EvaluationStatus::PendingStaff,
            self_evaluation: Stage::Unwritten,
            lead_review: Stage::Unwritten,
            hr_review: Stage::Unwritten,
            director_review: Stage::Unwritten,
            created_at,
            submitted_at: None,
            lead_reviewed_at: None,
            hr_reviewed_at: None,
            director_reviewed_at: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn final_grade(&self) -> Option<LetterGrade> {
        self.director_review
            .as_written()
            .map(|review| review.final_grade)
    }

    pub fn section_written(&self, section: EvaluationSection) -> bool {
        match section {
            EvaluationSection::SelfEvaluation => self.self_evaluation.is_written(),
            EvaluationSection::LeadReview => self.lead_review.is_written(),
            EvaluationSection::HrReview => self.hr_review.is_written(),
            EvaluationSection::DirectorReview => self.director_review.is_written(),
        }
    }

    pub fn section_timestamp(&self, section: EvaluationSection) -> Option<DateTime<Utc>> {
        match section {
            EvaluationSection::SelfEvaluation => self.submitted_at,
            EvaluationSection::LeadReview => self.lead_reviewed_at,
            EvaluationSection::HrReview => self.hr_reviewed_at,
            EvaluationSection::DirectorReview => self.director_reviewed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward() {
        assert!(EvaluationStatus::PendingStaff.can_advance_to(EvaluationStatus::SubmittedByStaff));
        assert!(EvaluationStatus::ReviewedByLead
            .can_advance_to(EvaluationStatus::PendingDirectorReview));
        assert!(!EvaluationStatus::ReviewedByLead.can_advance_to(EvaluationStatus::ReviewedByLead));
        assert!(!EvaluationStatus::Completed.can_advance_to(EvaluationStatus::PendingStaff));
    }

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in EvaluationStatus::ordered() {
            assert_eq!(status.as_str().parse::<EvaluationStatus>(), Ok(status));
        }
        assert!("archived".parse::<EvaluationStatus>().is_err());
        assert_eq!(
            serde_json::to_value(EvaluationStatus::PendingDirectorReview).expect("serializes"),
            "PENDING_DIRECTOR_REVIEW"
        );
    }

    #[test]
    fn grades_order_by_merit() {
        assert!(LetterGrade::A > LetterGrade::BPlus);
        assert!(LetterGrade::BMinus > LetterGrade::C);
        assert!(LetterGrade::D > LetterGrade::F);
        assert_eq!(" b- ".parse::<LetterGrade>(), Ok(LetterGrade::BMinus));
        assert!("E".parse::<LetterGrade>().is_err());
    }

    #[test]
    fn rating_rejects_values_above_five() {
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange(6)));
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(
            serde_json::from_str::<Rating>("4").expect("valid").value(),
            4
        );
    }

    #[test]
    fn unwritten_stage_serializes_as_null() {
        let stage: Stage<DirectorReview> = Stage::Unwritten;
        assert_eq!(serde_json::to_value(&stage).expect("serializes"), serde_json::Value::Null);

        let decoded: Stage<DirectorReview> =
            serde_json::from_str(r#"{"final_grade":"B+","comments":""}"#).expect("decodes");
        assert_eq!(
            decoded.as_written().map(|review| review.final_grade),
            Some(LetterGrade::BPlus)
        );
    }

    #[test]
    fn permissions_follow_the_role_table() {
        assert!(Role::Staff.has_permission(Permission::SubmitSelfEvaluation));
        assert!(!Role::Lead.has_permission(Permission::ViewReports));
        assert!(Role::Director.has_permission(Permission::ViewReports));
        assert!(Role::Admin.has_permission(Permission::ManageSettings));
        assert!(!Role::Admin.has_permission(Permission::ReviewAsDirector));
    }
}
