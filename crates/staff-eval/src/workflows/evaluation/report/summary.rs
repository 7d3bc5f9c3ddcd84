use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::super::deadlines::DeadlineSettings;
use super::super::domain::{Evaluation, EvaluationSection, EvaluationStatus, LetterGrade};
use super::export::ReportRow;
use super::views::{EvaluationReportSummary, GradeCountEntry, OverdueStageEntry, StatusCountEntry};

/// Period-level rollup of evaluation progress and outcomes.
#[derive(Debug, Default)]
pub struct EvaluationReport {
    pub period: String,
    pub status_counts: HashMap<EvaluationStatus, usize>,
    pub grade_counts: HashMap<LetterGrade, usize>,
    pub overdue: Vec<OverdueStageEntry>,
    pub rows: Vec<ReportRow>,
}

impl EvaluationReport {
    /// Builds the report from every record in `period`. A stage counts as overdue
    /// when it is the one currently open and its deadline is behind `now`.
    pub fn build(
        period: &str,
        records: &[Evaluation],
        deadlines: &DeadlineSettings,
        now: NaiveDateTime,
    ) -> Self {
        let mut report = Self {
            period: period.to_string(),
            ..Self::default()
        };

        for record in records.iter().filter(|record| record.period == period) {
            *report.status_counts.entry(record.status).or_default() += 1;

            if let Some(grade) = record.final_grade() {
                *report.grade_counts.entry(grade).or_default() += 1;
            }

            if let Some(section) = open_section(record.status) {
                if let Some(deadline) = deadlines.for_section(section) {
                    if now > deadline {
                        report.overdue.push(OverdueStageEntry {
                            evaluation_id: record.id.clone(),
                            employee: record.employee.clone(),
                            section,
                            section_label: section.label(),
                            deadline,
                        });
                    }
                }
            }

            report.rows.push(ReportRow::from(record));
        }

        report
    }

    pub fn total(&self) -> usize {
        self.status_counts.values().sum()
    }

    pub fn completed(&self) -> usize {
        self.status_counts
            .get(&EvaluationStatus::Completed)
            .copied()
            .unwrap_or(0)
    }

    pub fn completion_pct(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        ((self.completed() as f32 / total as f32) * 100.0).round()
    }

    pub fn summary(&self) -> EvaluationReportSummary {
        let status_counts = EvaluationStatus::ordered()
            .into_iter()
            .map(|status| StatusCountEntry {
                status,
                status_label: status.label(),
                count: self.status_counts.get(&status).copied().unwrap_or(0),
            })
            .collect();

        let grade_distribution = LetterGrade::ordered()
            .into_iter()
            .filter_map(|grade| {
                self.grade_counts
                    .get(&grade)
                    .map(|count| GradeCountEntry {
                        grade,
                        count: *count,
                    })
            })
            .collect();

        EvaluationReportSummary {
            period: self.period.clone(),
            total: self.total(),
            completed: self.completed(),
            completion_pct: self.completion_pct(),
            status_counts,
            grade_distribution,
            overdue: self.overdue.clone(),
        }
    }
}

fn open_section(status: EvaluationStatus) -> Option<EvaluationSection> {
    EvaluationSection::ordered()
        .into_iter()
        .find(|section| section.open_status() == status)
}
