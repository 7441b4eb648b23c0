//! Shared test helpers for study integration tests.
//!
//! [`ScriptedPresenter`] plays the participant: each presented trial pops
//! the next [`Step`] from its script.

#![allow(dead_code)]

use std::collections::VecDeque;

use study::engine::{PresentContext, Presenter, form};
use study::record::Response;
use study::{StudyError, Trial};

/// One participant action for one presentation.
#[derive(Clone, Debug)]
pub enum Step {
    /// Press button `n` without touching any input.
    Click(usize),
    /// Type the text character by character, then click Submit.
    Type(&'static str),
    /// Type the text, then press the confirm key.
    TypeEnter(&'static str),
    /// Submit form answers.
    Form(Vec<(&'static str, &'static str)>),
    /// Quit the session.
    Abort,
}

/// What the presenter observed on each presentation.
#[derive(Clone, Debug)]
pub struct Seen {
    pub trial_index: usize,
    pub trial_type: &'static str,
    pub rejection: Option<String>,
    pub had_answer_input: bool,
    pub missing_images: Vec<String>,
}

pub struct ScriptedPresenter {
    script: VecDeque<Step>,
    /// Skip wiring the answer field, as if it failed to render.
    pub ignore_answer_input: bool,
    pub seen: Vec<Seen>,
}

impl ScriptedPresenter {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: script.into(),
            ignore_answer_input: false,
            seen: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Presenter for ScriptedPresenter {
    fn present(
        &mut self,
        trial: &Trial,
        ctx: &mut PresentContext<'_>,
    ) -> Result<Response, StudyError> {
        self.seen.push(Seen {
            trial_index: ctx.trial_index,
            trial_type: trial.trial_type(),
            rejection: ctx.rejection.map(ToString::to_string),
            had_answer_input: ctx.answer.is_some(),
            missing_images: ctx.missing_images.to_vec(),
        });

        let step = self
            .script
            .pop_front()
            .ok_or_else(|| StudyError::Presentation("script exhausted".to_owned()))?;

        let answer = if self.ignore_answer_input {
            None
        } else {
            ctx.answer.as_deref_mut()
        };

        match step {
            Step::Click(i) => Ok(Response::Button(i)),
            Step::Type(text) => {
                if let Some(capture) = answer {
                    type_into(capture, text);
                }
                Ok(Response::Button(0))
            }
            Step::TypeEnter(text) => {
                if let Some(capture) = answer {
                    type_into(capture, text);
                    assert!(capture.commit(text), "commit should trigger submit");
                }
                Ok(Response::Button(0))
            }
            Step::Form(pairs) => Ok(form(pairs)),
            Step::Abort => Err(StudyError::Aborted),
        }
    }
}

fn type_into(capture: &mut study::AnswerCapture, text: &str) {
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        capture.input_changed(&current);
    }
}

pub fn participant_info() -> Step {
    Step::Form(vec![("name", "Ada Lovelace"), ("email", "ada@example.org")])
}

pub fn demographics() -> Step {
    Step::Form(vec![
        ("programming_exp", "3-5 years"),
        ("solidity_exp", "Beginner (read some code)"),
        ("role", "Researcher"),
    ])
}

pub fn post_survey() -> Step {
    Step::Form(vec![("tools_used", "Calculator")])
}

/// A complete script for the standard timeline with one step per problem.
pub fn full_script(answers: &[Step]) -> Vec<Step> {
    let mut steps = vec![
        Step::Click(0),
        participant_info(),
        demographics(),
        Step::Click(0),
    ];
    for (i, answer) in answers.iter().enumerate() {
        steps.push(answer.clone());
        if i + 1 < answers.len() {
            steps.push(Step::Click(0));
        }
    }
    steps.push(post_survey());
    steps.push(Step::Click(0));
    steps
}
