use serde::Serialize;

use super::domain::{HrRatings, LeadRatings, LetterGrade, Rating};

/// Suggested final grade used to pre-fill the director's form.
///
/// The composite is the unweighted mean of the self-grade points and the two
/// reviewer averages. Unrated (zero) scores count as zero and pull the suggestion
/// down; callers that need a fair suggestion must collect every rating first.
pub fn suggest_final_grade(
    self_grade: LetterGrade,
    lead: &LeadRatings,
    hr: &HrRatings,
) -> LetterGrade {
    GradeBreakdown::compute(self_grade, lead, hr).suggested
}

/// Transparent trail of the numbers behind a grade suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeBreakdown {
    pub self_grade: LetterGrade,
    pub self_points: f64,
    pub team_lead_avg: f64,
    pub hr_avg: f64,
    pub composite: f64,
    pub suggested: LetterGrade,
    /// Set when any reviewer rating is still the zero placeholder.
    pub has_unrated: bool,
}

impl GradeBreakdown {
    pub fn compute(self_grade: LetterGrade, lead: &LeadRatings, hr: &HrRatings) -> Self {
        let lead_values = lead.values();
        let hr_values = hr.values();

        let team_lead_avg = mean_rating(&lead_values);
        let hr_avg = mean_rating(&hr_values);
        let self_points = self_grade.points();
        let composite = (self_points + team_lead_avg + hr_avg) / 3.0;

        let has_unrated = lead_values
            .iter()
            .chain(hr_values.iter())
            .any(|rating| rating.is_unrated());

        Self {
            self_grade,
            self_points,
            team_lead_avg,
            hr_avg,
            composite,
            suggested: LetterGrade::from_composite(composite),
            has_unrated,
        }
    }
}

fn mean_rating(values: &[Rating]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().map(|rating| f64::from(rating.value())).sum();
    total / values.len() as f64
}
