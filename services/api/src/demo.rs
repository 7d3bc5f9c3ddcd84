use crate::infra::{InMemoryEvaluationRepository, InMemoryNotificationPublisher};
use chrono::{Duration, Local, NaiveDateTime, Utc};
use clap::Args;
use serde::Serialize;
use staff_eval::error::AppError;
use staff_eval::workflows::evaluation::report::views::EvaluationReportSummary;
use staff_eval::workflows::evaluation::{
    navigation_for, progress_rail, section_access, CreateEvaluation, DeadlineSettings,
    DeadlineStatus, DirectorReviewInput, EmployeeId, Evaluation, EvaluationFilter,
    EvaluationService, EvaluationServiceError, EvaluationStatus, EvaluationSummaryView,
    GradeBreakdown, GradeSuggestionInput, HrReviewInput, LeadReviewInput, ProgressLayout,
    ProgressStep, Role, SelfEvaluationInput, StageInput, StageSubmission, StepState,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = EvaluationService<InMemoryEvaluationRepository, InMemoryNotificationPublisher>;

#[derive(Args, Debug)]
pub(crate) struct GateArgs {
    /// Acting role (STAFF, LEAD, HR, DIRECTOR, ADMIN)
    #[arg(long)]
    pub(crate) role: Role,
    /// Current evaluation status, e.g. SUBMITTED_BY_STAFF
    #[arg(long)]
    pub(crate) status: EvaluationStatus,
    /// Resolve as if the record is being created
    #[arg(long)]
    pub(crate) new: bool,
    /// Progress rail layout (folded_hr or distinct_hr)
    #[arg(long, default_value_t = ProgressLayout::FoldedHr)]
    pub(crate) layout: ProgressLayout,
}

#[derive(Args, Debug)]
pub(crate) struct SuggestArgs {
    /// Self-assessed letter grade (A, B+, B-, C, D, F)
    #[arg(long)]
    pub(crate) self_grade: String,
    #[arg(long)]
    pub(crate) performance: i64,
    #[arg(long)]
    pub(crate) teamwork: i64,
    #[arg(long)]
    pub(crate) leadership: i64,
    #[arg(long)]
    pub(crate) attendance: i64,
    #[arg(long)]
    pub(crate) compliance: i64,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Evaluation period label used for the sample records
    #[arg(long, default_value = "Demo Period")]
    pub(crate) period: String,
    /// Progress rail layout (folded_hr or distinct_hr)
    #[arg(long, default_value_t = ProgressLayout::FoldedHr)]
    pub(crate) layout: ProgressLayout,
    /// Write the period report as CSV to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Print the outcome as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DemoOutcome {
    pub(crate) evaluations: Vec<EvaluationSummaryView>,
    pub(crate) report: EvaluationReportSummary,
    pub(crate) notifications_sent: usize,
}

pub(crate) fn run_gate(args: GateArgs) -> Result<(), AppError> {
    let GateArgs {
        role,
        status,
        new,
        layout,
    } = args;

    println!("{} viewing an evaluation that is {}", role.label(), status.label());
    for entry in section_access(Some(role), status, new) {
        println!("  {:<16} {}", entry.section_label, entry.access.label());
    }

    println!("\nProgress");
    render_progress(&progress_rail(status, layout));

    let items: Vec<&str> = navigation_for(Some(role))
        .into_iter()
        .map(|item| item.label())
        .collect();
    println!("\nNavigation: {}", items.join(", "));
    Ok(())
}

pub(crate) fn run_suggest(args: SuggestArgs) -> Result<(), AppError> {
    let input = GradeSuggestionInput {
        self_grade: args.self_grade,
        performance: args.performance,
        teamwork: args.teamwork,
        leadership: args.leadership,
        attendance: args.attendance,
        compliance: args.compliance,
    };
    let (self_grade, lead, hr) = input
        .validate()
        .map_err(EvaluationServiceError::Validation)?;

    render_breakdown(&GradeBreakdown::compute(self_grade, &lead, &hr));
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        layout,
        csv,
        json,
    } = args;

    let now = Local::now().naive_local();
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = EvaluationService::new(
        Arc::new(InMemoryEvaluationRepository::default()),
        notifications.clone(),
        layout,
    );
    service.update_deadlines(Some(Role::Admin), demo_deadlines(now))?;

    let outcome = drive_sample_evaluations(&service, &period, now)?;
    let report = service.report(Some(Role::Director), &period, now)?;

    if let Some(path) = csv {
        let file = File::create(&path)?;
        report.write_csv(file)?;
        if !json {
            println!("Report CSV written to {}", path.display());
        }
    }

    let outcome = DemoOutcome {
        evaluations: outcome.iter().map(EvaluationSummaryView::from).collect(),
        report: report.summary(),
        notifications_sent: notifications.events().len(),
    };

    if json {
        let rendered = serde_json::to_string_pretty(&outcome).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_outcome(&outcome);
    }

    Ok(())
}

fn demo_deadlines(now: NaiveDateTime) -> DeadlineSettings {
    DeadlineSettings {
        self_evaluation: Some(now - Duration::days(2)),
        lead_review: Some(now + Duration::days(7)),
        hr_review: Some(now + Duration::days(14)),
        director_review: Some(now + Duration::days(21)),
    }
}

/// Three staff members at different points of the review: one completed, one
/// awaiting the director, and one who has not started.
fn drive_sample_evaluations(
    service: &DemoService,
    period: &str,
    now: NaiveDateTime,
) -> Result<Vec<Evaluation>, AppError> {
    let completed = open_with_self_evaluation(service, period, "emp-001", "B+")?;
    let completed = advance(service, &completed, Role::Lead, lead_review(5, 4, 4))?;
    let completed = advance(service, &completed, Role::Hr, hr_review(5, 5))?;
    let suggestion = service.grade_suggestion(&completed.id, Some(Role::Director))?;
    let completed = advance(
        service,
        &completed,
        Role::Director,
        StageInput::DirectorReview(DirectorReviewInput {
            final_grade: suggestion.suggested.as_str().to_string(),
            comments: "Accepted the suggested grade".to_string(),
        }),
    )?;

    let awaiting = open_with_self_evaluation(service, period, "emp-002", "C")?;
    let awaiting = advance(service, &awaiting, Role::Lead, lead_review(3, 2, 3))?;
    let awaiting = advance(service, &awaiting, Role::Hr, hr_review(4, 3))?;

    let pending = service.create(
        CreateEvaluation {
            employee: EmployeeId("emp-003".to_string()),
            period: period.to_string(),
            self_evaluation: None,
        },
        Some(Role::Staff),
        Utc::now(),
    )?;

    let staff_deadline = DeadlineStatus::for_role(Some(Role::Staff), &service.deadlines(), now);
    if staff_deadline.is_passed {
        tracing::warn!(evaluation_id = %pending.id, "self evaluation deadline has passed");
    }

    Ok(service
        .list(&EvaluationFilter::for_period(period), Some(Role::Admin))?
        .into_iter()
        .filter(|record| [&completed.id, &awaiting.id, &pending.id].contains(&&record.id))
        .collect())
}

fn open_with_self_evaluation(
    service: &DemoService,
    period: &str,
    employee: &str,
    self_grade: &str,
) -> Result<Evaluation, AppError> {
    let record = service.create(
        CreateEvaluation {
            employee: EmployeeId(employee.to_string()),
            period: period.to_string(),
            self_evaluation: Some(SelfEvaluationInput {
                self_grade: self_grade.to_string(),
                achievements: "Delivered the quarterly roadmap".to_string(),
                challenges: "Cross-team dependencies".to_string(),
                goals: "Own the next platform migration".to_string(),
            }),
        },
        Some(Role::Staff),
        Utc::now(),
    )?;
    Ok(record)
}

fn advance(
    service: &DemoService,
    record: &Evaluation,
    role: Role,
    stage: StageInput,
) -> Result<Evaluation, AppError> {
    let submission = StageSubmission {
        expected_status: Some(record.status),
        stage,
    };
    let updated = service.submit_stage(&record.id, Some(role), submission, Utc::now())?;
    Ok(updated)
}

fn lead_review(performance: i64, teamwork: i64, leadership: i64) -> StageInput {
    StageInput::LeadReview(LeadReviewInput {
        performance,
        teamwork,
        leadership,
        comments: String::new(),
    })
}

fn hr_review(attendance: i64, compliance: i64) -> StageInput {
    StageInput::HrReview(HrReviewInput {
        attendance,
        compliance,
        comments: String::new(),
    })
}

fn render_progress(steps: &[ProgressStep]) {
    for step in steps {
        let marker = match step.state {
            StepState::Complete => "[x]",
            StepState::Current => "[>]",
            StepState::Upcoming => "[ ]",
        };
        println!("  {marker} {}", step.label);
    }
}

fn render_breakdown(breakdown: &GradeBreakdown) {
    println!(
        "Self grade {} ({:.1} points)",
        breakdown.self_grade, breakdown.self_points
    );
    println!("Team lead average {:.2}", breakdown.team_lead_avg);
    println!("HR average {:.2}", breakdown.hr_avg);
    println!("Composite {:.2}", breakdown.composite);
    println!("Suggested final grade: {}", breakdown.suggested);
    if breakdown.has_unrated {
        println!("Note: some ratings are still 0 (unrated) and lower the suggestion.");
    }
}

fn render_outcome(outcome: &DemoOutcome) {
    println!("Staff evaluation demo");
    for view in &outcome.evaluations {
        let grade = view
            .final_grade
            .map(|grade| grade.as_str())
            .unwrap_or("-");
        println!(
            "  {} {:<8} {:<24} final grade {}",
            view.evaluation_id, view.employee.0, view.status_label, grade
        );
    }

    let report = &outcome.report;
    println!(
        "\nPeriod {}: {}/{} completed ({:.0}%)",
        report.period, report.completed, report.total, report.completion_pct
    );
    for entry in report.status_counts.iter().filter(|entry| entry.count > 0) {
        println!("  {:<24} {}", entry.status_label, entry.count);
    }
    for entry in &report.grade_distribution {
        println!("  grade {:<3} {}", entry.grade.as_str(), entry.count);
    }
    for entry in &report.overdue {
        println!(
            "  overdue: {} {} (due {})",
            entry.evaluation_id, entry.section_label, entry.deadline
        );
    }
    println!("\nNotifications sent: {}", outcome.notifications_sent);
}
