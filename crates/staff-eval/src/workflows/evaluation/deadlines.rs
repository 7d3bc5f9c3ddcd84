use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{EvaluationSection, Role};

/// Per-stage deadlines configured by administrators for the active period.
///
/// Times are wall-clock values with no zone attached; comparisons happen against
/// the caller's local `now` exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineSettings {
    #[serde(default)]
    pub self_evaluation: Option<NaiveDateTime>,
    #[serde(default)]
    pub lead_review: Option<NaiveDateTime>,
    #[serde(default)]
    pub hr_review: Option<NaiveDateTime>,
    #[serde(default)]
    pub director_review: Option<NaiveDateTime>,
}

impl DeadlineSettings {
    pub fn for_section(&self, section: EvaluationSection) -> Option<NaiveDateTime> {
        match section {
            EvaluationSection::SelfEvaluation => self.self_evaluation,
            EvaluationSection::LeadReview => self.lead_review,
            EvaluationSection::HrReview => self.hr_review,
            EvaluationSection::DirectorReview => self.director_review,
        }
    }

    pub fn for_role(&self, role: Option<Role>) -> Option<NaiveDateTime> {
        match role? {
            Role::Staff => self.self_evaluation,
            Role::Lead => self.lead_review,
            Role::Hr => self.hr_review,
            Role::Director => self.director_review,
            Role::Admin => None,
        }
    }
}

/// Deadline applicable to an actor, used for "deadline passed" warnings only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadlineStatus {
    pub deadline: Option<NaiveDateTime>,
    pub is_passed: bool,
}

impl DeadlineStatus {
    pub fn for_role(role: Option<Role>, settings: &DeadlineSettings, now: NaiveDateTime) -> Self {
        Self::from_deadline(settings.for_role(role), now)
    }

    pub fn for_section(
        section: EvaluationSection,
        settings: &DeadlineSettings,
        now: NaiveDateTime,
    ) -> Self {
        Self::from_deadline(settings.for_section(section), now)
    }

    fn from_deadline(deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        Self {
            deadline,
            is_passed: deadline.map(|deadline| now > deadline).unwrap_or(false),
        }
    }
}
