use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::EvaluationStatus;

/// Whether HR review is drawn as its own node on the progress rail or folded
/// into the lead review node. Deployments choose; the default folds it.
///
/// `FoldedHr` (the default) is a 4-node rail, one node shorter than the
/// 5-node `DistinctHr` rail, so its step indices stay in `0..=3`. Lead and HR
/// review both map to the single "Reviews" node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLayout {
    #[default]
    FoldedHr,
    DistinctHr,
}

impl ProgressLayout {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FoldedHr => "folded_hr",
            Self::DistinctHr => "distinct_hr",
        }
    }

    pub const fn step_labels(self) -> &'static [&'static str] {
        match self {
            Self::FoldedHr => &["Self Evaluation", "Reviews", "Director Review", "Completed"],
            Self::DistinctHr => &[
                "Self Evaluation",
                "Lead Review",
                "HR Review",
                "Director Review",
                "Completed",
            ],
        }
    }

    pub const fn last_index(self) -> usize {
        self.step_labels().len() - 1
    }
}

impl fmt::Display for ProgressLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressLayout {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "folded_hr" | "folded" => Ok(Self::FoldedHr),
            "distinct_hr" | "distinct" => Ok(Self::DistinctHr),
            other => Err(format!(
                "unknown progress layout '{other}' (expected folded_hr or distinct_hr)"
            )),
        }
    }
}

/// Position of `status` on the rail. Non-decreasing along the status order.
pub fn step_index(status: EvaluationStatus, layout: ProgressLayout) -> usize {
    match (layout, status) {
        (_, EvaluationStatus::PendingStaff | EvaluationStatus::SubmittedByStaff) => 0,
        (ProgressLayout::FoldedHr, EvaluationStatus::ReviewedByLead)
        | (ProgressLayout::FoldedHr, EvaluationStatus::ReviewedByHr) => 1,
        (ProgressLayout::FoldedHr, EvaluationStatus::PendingDirectorReview) => 2,
        (ProgressLayout::FoldedHr, EvaluationStatus::Completed) => 3,
        (ProgressLayout::DistinctHr, EvaluationStatus::ReviewedByLead) => 1,
        (ProgressLayout::DistinctHr, EvaluationStatus::ReviewedByHr) => 2,
        (ProgressLayout::DistinctHr, EvaluationStatus::PendingDirectorReview) => 3,
        (ProgressLayout::DistinctHr, EvaluationStatus::Completed) => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Complete,
    Current,
    Upcoming,
}

impl StepState {
    pub fn classify(current_index: usize, step: usize) -> Self {
        if current_index > step {
            Self::Complete
        } else if current_index == step {
            Self::Current
        } else {
            Self::Upcoming
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub index: usize,
    pub label: &'static str,
    pub state: StepState,
}

pub fn progress_rail(status: EvaluationStatus, layout: ProgressLayout) -> Vec<ProgressStep> {
    let current = step_index(status, layout);
    layout
        .step_labels()
        .iter()
        .enumerate()
        .map(|(index, label)| ProgressStep {
            index,
            label: *label,
            state: StepState::classify(current, index),
        })
        .collect()
}
