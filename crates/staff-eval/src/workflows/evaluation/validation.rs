//! Form payloads as submitted, and their conversion into typed evaluation sections.
//!
//! Inputs keep raw integers and grade strings so out-of-range values reach this
//! module and come back as field-level messages rather than opaque decode errors.

use serde::{Deserialize, Serialize};

use super::domain::{
    DirectorReview, EvaluationSection, HrRatings, HrReview, LeadRatings, LeadReview, LetterGrade,
    Rating, SelfEvaluation,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEvaluationInput {
    pub self_grade: String,
    pub achievements: String,
    #[serde(default)]
    pub challenges: String,
    #[serde(default)]
    pub goals: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadReviewInput {
    pub performance: i64,
    pub teamwork: i64,
    pub leadership: i64,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrReviewInput {
    pub attendance: i64,
    pub compliance: i64,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorReviewInput {
    pub final_grade: String,
    #[serde(default)]
    pub comments: String,
}

/// One stage's form content, tagged with the section it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum StageInput {
    SelfEvaluation(SelfEvaluationInput),
    LeadReview(LeadReviewInput),
    HrReview(HrReviewInput),
    DirectorReview(DirectorReviewInput),
}

impl StageInput {
    pub const fn section(&self) -> EvaluationSection {
        match self {
            StageInput::SelfEvaluation(_) => EvaluationSection::SelfEvaluation,
            StageInput::LeadReview(_) => EvaluationSection::LeadReview,
            StageInput::HrReview(_) => EvaluationSection::HrReview,
            StageInput::DirectorReview(_) => EvaluationSection::DirectorReview,
        }
    }

    pub fn validate(self) -> Result<ValidatedStage, Vec<FieldError>> {
        let mut errors = Vec::new();

        let stage = match self {
            StageInput::SelfEvaluation(input) => {
                let self_grade = grade_field("self_grade", &input.self_grade, &mut errors);
                required_text("achievements", &input.achievements, &mut errors);
                ValidatedStage::SelfEvaluation(SelfEvaluation {
                    self_grade,
                    achievements: input.achievements.trim().to_string(),
                    challenges: input.challenges.trim().to_string(),
                    goals: input.goals.trim().to_string(),
                })
            }
            StageInput::LeadReview(input) => ValidatedStage::LeadReview(LeadReview {
                ratings: LeadRatings {
                    performance: rating_field("performance", input.performance, &mut errors),
                    teamwork: rating_field("teamwork", input.teamwork, &mut errors),
                    leadership: rating_field("leadership", input.leadership, &mut errors),
                },
                comments: input.comments.trim().to_string(),
            }),
            StageInput::HrReview(input) => ValidatedStage::HrReview(HrReview {
                ratings: HrRatings {
                    attendance: rating_field("attendance", input.attendance, &mut errors),
                    compliance: rating_field("compliance", input.compliance, &mut errors),
                },
                comments: input.comments.trim().to_string(),
            }),
            StageInput::DirectorReview(input) => ValidatedStage::DirectorReview(DirectorReview {
                final_grade: grade_field("final_grade", &input.final_grade, &mut errors),
                comments: input.comments.trim().to_string(),
            }),
        };

        if errors.is_empty() {
            Ok(stage)
        } else {
            Err(errors)
        }
    }
}

/// A section that passed validation and can be written to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedStage {
    SelfEvaluation(SelfEvaluation),
    LeadReview(LeadReview),
    HrReview(HrReview),
    DirectorReview(DirectorReview),
}

impl ValidatedStage {
    pub const fn section(&self) -> EvaluationSection {
        match self {
            ValidatedStage::SelfEvaluation(_) => EvaluationSection::SelfEvaluation,
            ValidatedStage::LeadReview(_) => EvaluationSection::LeadReview,
            ValidatedStage::HrReview(_) => EvaluationSection::HrReview,
            ValidatedStage::DirectorReview(_) => EvaluationSection::DirectorReview,
        }
    }
}

/// Inputs for a stateless grade suggestion, as typed into the director's form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSuggestionInput {
    pub self_grade: String,
    pub performance: i64,
    pub teamwork: i64,
    pub leadership: i64,
    pub attendance: i64,
    pub compliance: i64,
}

impl GradeSuggestionInput {
    pub fn validate(&self) -> Result<(LetterGrade, LeadRatings, HrRatings), Vec<FieldError>> {
        let mut errors = Vec::new();
        let self_grade = grade_field("self_grade", &self.self_grade, &mut errors);
        let lead = LeadRatings {
            performance: rating_field("performance", self.performance, &mut errors),
            teamwork: rating_field("teamwork", self.teamwork, &mut errors),
            leadership: rating_field("leadership", self.leadership, &mut errors),
        };
        let hr = HrRatings {
            attendance: rating_field("attendance", self.attendance, &mut errors),
            compliance: rating_field("compliance", self.compliance, &mut errors),
        };

        if errors.is_empty() {
            Ok((self_grade, lead, hr))
        } else {
            Err(errors)
        }
    }
}

/// Message attached to a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn rating_field(field: &'static str, raw: i64, errors: &mut Vec<FieldError>) -> Rating {
    match u8::try_from(raw).ok().map(Rating::new) {
        Some(Ok(rating)) => rating,
        _ => {
            errors.push(FieldError::new(
                field,
                format!("rating must be between 0 and {}, got {raw}", Rating::MAX),
            ));
            Rating::UNRATED
        }
    }
}

fn grade_field(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> LetterGrade {
    match raw.parse::<LetterGrade>() {
        Ok(grade) => grade,
        Err(err) => {
            errors.push(FieldError::new(field, err.to_string()));
            LetterGrade::F
        }
    }
}

fn required_text(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) {
    if raw.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
}
