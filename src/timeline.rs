//! Timeline builder.
//!
//! Turns a [`Catalog`] into the fixed, ordered list of trials:
//!
//! ```text
//! preload, welcome, participant info, demographics, instructions,
//! problem 1, break 1, ..., break N-1, problem N,
//! post survey, end
//! ```
//!
//! Every problem is followed by a break except the last. The order never
//! depends on participant input.

use sha2::{Digest, Sha256};

use crate::catalog::{Catalog, ProblemDescriptor};
use crate::trial::{ButtonTrial, ProblemMetadata, ProblemTrial, Stimulus, Trial, TrialKind};

// ---------------------------------------------------------------------------
// Per-problem context
// ---------------------------------------------------------------------------

/// Everything needed to build one problem/break pair.
#[derive(Clone, Copy, Debug)]
pub struct ProblemContext<'a> {
    /// 0-based position in the catalog.
    pub index: usize,
    pub total: usize,
    pub problem: &'a ProblemDescriptor,
}

impl ProblemContext<'_> {
    /// 1-based problem number shown to the participant.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }

    #[must_use]
    pub fn problem_trial(&self) -> Trial {
        let number = self.number();
        Trial::Problem(ProblemTrial {
            stimulus: Stimulus::new()
                .caption(format!("Problem {number} of {}", self.total))
                .image(self.problem.image.clone()),
            image: self.problem.image.clone(),
            input_label: "Return value:".to_owned(),
            input_placeholder: "Enter number".to_owned(),
            choices: vec!["Submit".to_owned()],
            metadata: ProblemMetadata {
                task: "problem".to_owned(),
                problem_name: self.problem.name.clone(),
                problem_number: number,
                complexity: self.problem.complexity,
                correct_answer: self.problem.answer,
            },
        })
    }

    /// Break screen after this problem, or `None` after the last one.
    #[must_use]
    pub fn break_trial(&self) -> Option<Trial> {
        if self.is_last() {
            return None;
        }
        Some(Trial::Break(ButtonTrial {
            stimulus: Stimulus::new()
                .subheading(format!("Problem {} Complete", self.number()))
                .paragraph("Take a short break if needed.")
                .paragraph("Select \"Next\" when you are ready for the next problem."),
            choices: vec!["Next".to_owned()],
        }))
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// The ordered presentation plan. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    trials: Vec<Trial>,
}

impl Timeline {
    /// Build the plan for `catalog`. An empty problem list still yields the
    /// fixed head and tail trials.
    #[must_use]
    pub fn build(catalog: &Catalog) -> Self {
        let total = catalog.problems.len();
        let mut trials = Vec::with_capacity(7 + total * 2);

        trials.push(Trial::Preload {
            images: catalog.images().map(str::to_owned).collect(),
        });
        trials.push(Trial::Informational(ButtonTrial {
            stimulus: catalog.welcome.clone(),
            choices: vec![catalog.welcome_button.clone()],
        }));
        trials.push(Trial::FreeTextSurvey {
            questions: catalog.participant_info.clone(),
        });
        trials.push(Trial::MultipleChoiceSurvey {
            questions: catalog.demographics.clone(),
        });
        trials.push(Trial::Informational(ButtonTrial {
            stimulus: catalog.instructions.clone(),
            choices: vec![catalog.instructions_button.clone()],
        }));

        for (index, problem) in catalog.problems.iter().enumerate() {
            let ctx = ProblemContext {
                index,
                total,
                problem,
            };
            trials.push(ctx.problem_trial());
            trials.extend(ctx.break_trial());
        }

        trials.push(Trial::MultipleChoiceSurvey {
            questions: catalog.post_survey.clone(),
        });
        trials.push(Trial::Informational(ButtonTrial {
            stimulus: catalog.end.clone(),
            choices: vec![catalog.end_button.clone()],
        }));

        tracing::debug!(trials = trials.len(), problems = total, "timeline built");
        Self { trials }
    }

    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    /// Kinds of all trials, in order.
    #[must_use]
    pub fn shape(&self) -> Vec<TrialKind> {
        self.trials.iter().map(Trial::kind).collect()
    }

    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.count(TrialKind::Problem)
    }

    #[must_use]
    pub fn count(&self, kind: TrialKind) -> usize {
        self.trials.iter().filter(|t| t.kind() == kind).count()
    }

    /// Deterministic SHA-256 of the whole plan (lowercase hex, 64 chars).
    ///
    /// Each trial is hashed as its JSON form followed by `'\n'`, so any
    /// change in order, kind, content or metadata changes the fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for trial in &self.trials {
            hasher.update(serde_json::to_vec(trial).unwrap_or_default());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Complexity, standard_problems};
    use crate::trial::TrialKind::{
        Break, FreeTextSurvey, Informational, MultipleChoiceSurvey, Preload, Problem,
    };

    #[test]
    fn standard_shape() {
        let timeline = Timeline::build(&Catalog::default());
        assert_eq!(
            timeline.shape(),
            vec![
                Preload,
                Informational,
                FreeTextSurvey,
                MultipleChoiceSurvey,
                Informational,
                Problem,
                Break,
                Problem,
                Break,
                Problem,
                Break,
                Problem,
                Break,
                Problem,
                MultipleChoiceSurvey,
                Informational,
            ]
        );
        assert_eq!(timeline.count(Problem) + timeline.count(Break), 9);
    }

    #[test]
    fn problems_numbered_in_catalog_order() {
        let timeline = Timeline::build(&Catalog::default());
        let numbers: Vec<(usize, String, i64)> = timeline
            .iter()
            .filter_map(Trial::problem)
            .map(|p| {
                (
                    p.metadata.problem_number,
                    p.metadata.problem_name.clone(),
                    p.metadata.correct_answer,
                )
            })
            .collect();
        assert_eq!(
            numbers,
            vec![
                (1, "GreenHouse".to_owned(), 7651),
                (2, "HubPool".to_owned(), 954),
                (3, "PercentageFeeModel".to_owned(), 85),
                (4, "LockupContract".to_owned(), 6000),
                (5, "Lock".to_owned(), 6800),
            ]
        );
        let first = timeline.iter().find_map(Trial::problem).unwrap();
        assert_eq!(first.metadata.task, "problem");
        assert_eq!(first.metadata.complexity, Complexity::Low);
        assert_eq!(first.stimulus.blocks[0], crate::trial::Block::Caption("Problem 1 of 5".to_owned()));
    }

    #[test]
    fn preload_lists_all_images() {
        let timeline = Timeline::build(&Catalog::default());
        match &timeline.trials()[0] {
            Trial::Preload { images } => assert_eq!(
                images,
                &[
                    "problem_1.png",
                    "problem_2.png",
                    "problem_3.png",
                    "problem_4.png",
                    "problem_5.png"
                ]
            ),
            other => panic!("expected preload first, got {other:?}"),
        }
    }

    #[test]
    fn break_titles_follow_problem_numbers() {
        let timeline = Timeline::build(&Catalog::default());
        let titles: Vec<&str> = timeline
            .iter()
            .filter_map(|t| match t {
                Trial::Break(b) => b.stimulus.title(),
                _ => None,
            })
            .collect();
        assert_eq!(
            titles,
            vec![
                "Problem 1 Complete",
                "Problem 2 Complete",
                "Problem 3 Complete",
                "Problem 4 Complete"
            ]
        );
    }

    #[test]
    fn empty_catalog_keeps_head_and_tail() {
        let timeline = Timeline::build(&Catalog::new("t", Vec::new()));
        assert_eq!(
            timeline.shape(),
            vec![
                Preload,
                Informational,
                FreeTextSurvey,
                MultipleChoiceSurvey,
                Informational,
                MultipleChoiceSurvey,
                Informational,
            ]
        );
    }

    #[test]
    fn single_problem_has_no_break() {
        let problems = standard_problems()[..1].to_vec();
        let timeline = Timeline::build(&Catalog::new("t", problems));
        assert_eq!(timeline.count(Problem), 1);
        assert_eq!(timeline.count(Break), 0);
    }

    #[test]
    fn rebuild_is_identical() {
        let catalog = Catalog::default();
        let a = Timeline::build(&catalog);
        let b = Timeline::build(&catalog);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_tracks_answers() {
        let mut problems = standard_problems();
        let base = Timeline::build(&Catalog::new("t", problems.clone())).fingerprint();
        problems[2].answer = 86;
        let changed = Timeline::build(&Catalog::new("t", problems)).fingerprint();
        assert_ne!(base, changed);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::catalog::Complexity;
    use proptest::prelude::*;

    fn arb_problems() -> impl Strategy<Value = Vec<ProblemDescriptor>> {
        prop::collection::vec((0i64..100_000, "[A-Za-z]{1,12}"), 0..12).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (answer, name))| ProblemDescriptor {
                    image: format!("problem_{}.png", i + 1),
                    name,
                    complexity: Complexity::Medium,
                    answer,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_one_break_between_problems(problems in arb_problems()) {
            let n = problems.len();
            let timeline = Timeline::build(&Catalog::new("t", problems));
            let shape = timeline.shape();

            prop_assert_eq!(timeline.count(TrialKind::Problem), n);
            prop_assert_eq!(timeline.count(TrialKind::Break), n.saturating_sub(1));
            prop_assert_eq!(timeline.len(), 7 + n + n.saturating_sub(1));

            for pair in shape.windows(2) {
                if pair[0] == TrialKind::Problem {
                    prop_assert_ne!(pair[1], TrialKind::Problem);
                }
                if pair[1] == TrialKind::Break {
                    prop_assert_eq!(pair[0], TrialKind::Problem);
                }
            }
            let last_problem = shape.iter().rposition(|k| *k == TrialKind::Problem);
            if let Some(pos) = last_problem {
                prop_assert_eq!(shape[pos + 1], TrialKind::MultipleChoiceSurvey);
            }
        }

        #[test]
        fn prop_build_is_deterministic(problems in arb_problems()) {
            let catalog = Catalog::new("t", problems);
            prop_assert_eq!(
                Timeline::build(&catalog).fingerprint(),
                Timeline::build(&catalog).fingerprint()
            );
        }
    }
}
