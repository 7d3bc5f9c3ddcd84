use chrono::NaiveDateTime;
use serde::Serialize;

use super::super::domain::{
    EmployeeId, EvaluationId, EvaluationSection, EvaluationStatus, LetterGrade,
};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: EvaluationStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeCountEntry {
    pub grade: LetterGrade,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueStageEntry {
    pub evaluation_id: EvaluationId,
    pub employee: EmployeeId,
    pub section: EvaluationSection,
    pub section_label: &'static str,
    pub deadline: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReportSummary {
    pub period: String,
    pub total: usize,
    pub completed: usize,
    pub completion_pct: f32,
    pub status_counts: Vec<StatusCountEntry>,
    pub grade_distribution: Vec<GradeCountEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overdue: Vec<OverdueStageEntry>,
}
