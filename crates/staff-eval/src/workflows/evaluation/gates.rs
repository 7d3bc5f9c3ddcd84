//! Single source of truth for which evaluation sections an actor may see and edit.
//!
//! Every call site (record pages, form sections, the service's write path) resolves
//! access through this module instead of re-deriving role checks locally. All
//! functions are total: a missing or unrecognised role resolves to no rights.

use serde::{Deserialize, Serialize};

use super::domain::{Evaluation, EvaluationSection, EvaluationStatus, Role, Stage};

/// Per-section edit rights for one actor against one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditGate {
    pub can_edit_self: bool,
    pub can_edit_lead: bool,
    pub can_edit_hr: bool,
    pub can_edit_director: bool,
}

impl EditGate {
    pub fn resolve(role: Option<Role>, status: EvaluationStatus, is_new: bool) -> Self {
        let Some(role) = role else {
            return Self::default();
        };

        Self {
            can_edit_self: role == Role::Staff
                && (is_new || status == EvaluationStatus::PendingStaff),
            can_edit_lead: role == Role::Lead && status == EvaluationStatus::SubmittedByStaff,
            can_edit_hr: role == Role::Hr && status == EvaluationStatus::ReviewedByLead,
            can_edit_director: role == Role::Director
                && status == EvaluationStatus::PendingDirectorReview,
        }
    }

    pub fn can_edit(&self, section: EvaluationSection) -> bool {
        match section {
            EvaluationSection::SelfEvaluation => self.can_edit_self,
            EvaluationSection::LeadReview => self.can_edit_lead,
            EvaluationSection::HrReview => self.can_edit_hr,
            EvaluationSection::DirectorReview => self.can_edit_director,
        }
    }

    /// The one section the actor may write, if any. Flags are mutually
    /// exclusive because each flag requires a different role.
    pub fn editable_section(&self) -> Option<EvaluationSection> {
        EvaluationSection::ordered()
            .into_iter()
            .find(|section| self.can_edit(*section))
    }

    pub fn editable_count(&self) -> usize {
        EvaluationSection::ordered()
            .into_iter()
            .filter(|section| self.can_edit(*section))
            .count()
    }
}

/// Per-section visibility. Broader than [`EditGate`]: reviewers can read sections
/// they cannot write, and everyone can read sections once the workflow passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionVisibility {
    pub show_self: bool,
    pub show_lead: bool,
    pub show_hr: bool,
    pub show_director: bool,
}

impl SectionVisibility {
    pub fn resolve(role: Option<Role>, status: EvaluationStatus) -> Self {
        let role_in = |roles: &[Role]| role.map(|role| roles.contains(&role)).unwrap_or(false);

        let show_lead = role_in(&[Role::Lead, Role::Hr, Role::Director, Role::Admin])
            || status != EvaluationStatus::PendingStaff;
        let show_hr = role_in(&[Role::Hr, Role::Lead, Role::Admin])
            || matches!(
                status,
                EvaluationStatus::ReviewedByLead | EvaluationStatus::Completed
            );
        let show_director = role_in(&[Role::Director, Role::Admin])
            || matches!(
                status,
                EvaluationStatus::PendingDirectorReview | EvaluationStatus::Completed
            );

        Self {
            show_self: true,
            show_lead,
            show_hr,
            show_director,
        }
    }

    pub fn is_visible(&self, section: EvaluationSection) -> bool {
        match section {
            EvaluationSection::SelfEvaluation => self.show_self,
            EvaluationSection::LeadReview => self.show_lead,
            EvaluationSection::HrReview => self.show_hr,
            EvaluationSection::DirectorReview => self.show_director,
        }
    }

    /// Clears hidden sections (and their review timestamps) so a read response
    /// never carries content the actor could not see on the record page.
    pub fn redact(&self, mut record: Evaluation) -> Evaluation {
        if !self.show_self {
            record.self_evaluation = Stage::Unwritten;
            record.submitted_at = None;
        }
        if !self.show_lead {
            record.lead_review = Stage::Unwritten;
            record.lead_reviewed_at = None;
        }
        if !self.show_hr {
            record.hr_review = Stage::Unwritten;
            record.hr_reviewed_at = None;
        }
        if !self.show_director {
            record.director_review = Stage::Unwritten;
            record.director_reviewed_at = None;
        }
        record
    }
}

/// How a form should render a section's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionAccess {
    Hidden,
    ReadOnly,
    Editable,
}

impl SectionAccess {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::ReadOnly => "read-only",
            Self::Editable => "editable",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionAccessEntry {
    pub section: EvaluationSection,
    pub section_label: &'static str,
    pub access: SectionAccess,
}

/// Combines edit and visibility rights into one rendering decision per section.
/// An editable section is always shown; controls stay disabled whenever the
/// edit flag is false, regardless of visibility.
pub fn section_access(
    role: Option<Role>,
    status: EvaluationStatus,
    is_new: bool,
) -> Vec<SectionAccessEntry> {
    let gate = EditGate::resolve(role, status, is_new);
    let visibility = SectionVisibility::resolve(role, status);

    EvaluationSection::ordered()
        .into_iter()
        .map(|section| {
            let access = if gate.can_edit(section) {
                SectionAccess::Editable
            } else if visibility.is_visible(section) {
                SectionAccess::ReadOnly
            } else {
                SectionAccess::Hidden
            };
            SectionAccessEntry {
                section,
                section_label: section.label(),
                access,
            }
        })
        .collect()
}
