use proptest::prelude::*;
use staff_eval::workflows::evaluation::{
    step_index, suggest_final_grade, EditGate, EvaluationStatus, HrRatings, LeadRatings,
    LetterGrade, ProgressLayout, Rating, Role,
};

fn rating() -> impl Strategy<Value = Rating> {
    (0u8..=Rating::MAX).prop_map(|value| Rating::new(value).expect("in range"))
}

fn grade() -> impl Strategy<Value = LetterGrade> {
    prop::sample::select(LetterGrade::ordered().to_vec())
}

fn status() -> impl Strategy<Value = EvaluationStatus> {
    prop::sample::select(EvaluationStatus::ordered().to_vec())
}

fn role() -> impl Strategy<Value = Option<Role>> {
    prop::option::of(prop::sample::select(Role::ordered().to_vec()))
}

fn layout() -> impl Strategy<Value = ProgressLayout> {
    prop_oneof![Just(ProgressLayout::FoldedHr), Just(ProgressLayout::DistinctHr)]
}

fn bump(rating: Rating) -> Rating {
    Rating::new((rating.value() + 1).min(Rating::MAX)).expect("in range")
}

proptest! {
    #[test]
    fn raising_a_lead_rating_never_lowers_the_suggestion(
        self_grade in grade(),
        performance in rating(),
        teamwork in rating(),
        leadership in rating(),
        attendance in rating(),
        compliance in rating(),
        which in 0usize..3,
    ) {
        let hr = HrRatings { attendance, compliance };
        let before = LeadRatings { performance, teamwork, leadership };
        let mut after = before;
        match which {
            0 => after.performance = bump(after.performance),
            1 => after.teamwork = bump(after.teamwork),
            _ => after.leadership = bump(after.leadership),
        }

        prop_assert!(
            suggest_final_grade(self_grade, &after, &hr)
                >= suggest_final_grade(self_grade, &before, &hr)
        );
    }

    #[test]
    fn raising_an_hr_rating_never_lowers_the_suggestion(
        self_grade in grade(),
        performance in rating(),
        teamwork in rating(),
        leadership in rating(),
        attendance in rating(),
        compliance in rating(),
    ) {
        let lead = LeadRatings { performance, teamwork, leadership };
        let before = HrRatings { attendance, compliance };
        let after = HrRatings { attendance: bump(attendance), compliance };

        prop_assert!(
            suggest_final_grade(self_grade, &lead, &after)
                >= suggest_final_grade(self_grade, &lead, &before)
        );
    }

    #[test]
    fn better_self_grade_never_lowers_the_suggestion(
        low in grade(),
        high in grade(),
        performance in rating(),
        teamwork in rating(),
        leadership in rating(),
        attendance in rating(),
        compliance in rating(),
    ) {
        prop_assume!(low <= high);
        let lead = LeadRatings { performance, teamwork, leadership };
        let hr = HrRatings { attendance, compliance };

        prop_assert!(
            suggest_final_grade(high, &lead, &hr) >= suggest_final_grade(low, &lead, &hr)
        );
    }

    #[test]
    fn at_most_one_section_is_ever_editable(
        role in role(),
        status in status(),
        is_new in any::<bool>(),
    ) {
        let gate = EditGate::resolve(role, status, is_new);
        prop_assert!(gate.editable_count() <= 1);
        if role.is_none() {
            prop_assert_eq!(gate, EditGate::default());
        }
    }

    #[test]
    fn progress_never_moves_backwards(
        layout in layout(),
        first in status(),
        second in status(),
    ) {
        let (earlier, later) = if first.ordinal() <= second.ordinal() {
            (first, second)
        } else {
            (second, first)
        };

        prop_assert!(step_index(earlier, layout) <= step_index(later, layout));
        prop_assert!(step_index(later, layout) <= layout.last_index());
    }
}
