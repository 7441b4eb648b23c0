//! Presentation engine.
//!
//! [`Engine::run`] walks a [`Timeline`] in order. For each trial it creates
//! the trial's lifecycle state, calls `on_enter`, asks the [`Presenter`] for
//! a response, checks the response against the trial's schema, calls
//! `on_exit` and appends a [`ResultRecord`] to the session log. Exactly one
//! trial is active at a time, and a trial is fully finalized before the next
//! one is entered.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::assets::AssetResolver;
use crate::capture::AnswerCapture;
use crate::error::StudyError;
use crate::record::{ResultRecord, Response, SessionLog};
use crate::timeline::Timeline;
use crate::trial::Trial;

// ---------------------------------------------------------------------------
// Presenter contract
// ---------------------------------------------------------------------------

/// What the presenter may see and touch while a trial is on screen.
pub struct PresentContext<'a> {
    /// 0-based timeline position.
    pub trial_index: usize,
    pub trial_count: usize,
    /// Why the previous response for this trial was rejected.
    pub rejection: Option<&'a FormError>,
    /// The answer field of a problem trial.
    pub answer: Option<&'a mut AnswerCapture>,
    /// Images that failed to resolve during preload.
    pub missing_images: &'a [String],
    pub assets: &'a AssetResolver,
}

/// Shows trials to the participant and collects responses.
pub trait Presenter {
    /// Present `trial` until the participant responds.
    ///
    /// # Errors
    /// `StudyError::Aborted` when the participant quits, or
    /// `StudyError::Presentation` when the screen cannot be driven.
    fn present(&mut self, trial: &Trial, ctx: &mut PresentContext<'_>) -> Result<Response, StudyError>;
}

// ---------------------------------------------------------------------------
// Form validation
// ---------------------------------------------------------------------------

/// Why a response cannot advance the timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormError {
    /// Required questions left empty.
    pub missing: Vec<String>,
    /// Answers that are not among the offered options.
    pub invalid: Vec<String>,
    /// The response does not fit the trial at all.
    pub wrong_shape: bool,
}

impl FormError {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty() && !self.wrong_shape
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wrong_shape {
            return write!(f, "unexpected response for this screen");
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("please answer: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("not a valid option: {}", self.invalid.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FormError {}

/// Check a response against the trial's schema.
///
/// Required fields must be non-empty after trimming, choices must be one
/// of the options, and button indices must exist.
///
/// # Errors
/// Returns the [`FormError`] describing every problem found.
pub fn validate_response(trial: &Trial, response: &Response) -> Result<(), FormError> {
    let mut error = FormError::default();

    match (trial, response) {
        (Trial::Preload { .. }, _) => {}
        (Trial::Informational(_) | Trial::Break(_) | Trial::Problem(_), Response::Button(i)) => {
            if *i >= trial.choices().len() {
                error.wrong_shape = true;
            }
        }
        (Trial::FreeTextSurvey { questions }, Response::Form(values)) => {
            for q in questions {
                let empty = values.get(&q.name).is_none_or(|v| v.trim().is_empty());
                if q.required && empty {
                    error.missing.push(q.name.clone());
                }
            }
        }
        (Trial::MultipleChoiceSurvey { questions }, Response::Form(values)) => {
            for q in questions {
                match values.get(&q.name) {
                    None => {
                        if q.required {
                            error.missing.push(q.name.clone());
                        }
                    }
                    Some(v) if !q.options.iter().any(|o| o == v) => {
                        error.invalid.push(q.name.clone());
                    }
                    Some(_) => {}
                }
            }
        }
        _ => error.wrong_shape = true,
    }

    if error.is_empty() { Ok(()) } else { Err(error) }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Finished,
    /// The participant quit while this trial was on screen.
    Aborted { trial_index: usize },
}

#[derive(Clone, Debug, Default)]
pub struct Engine {
    assets: AssetResolver,
}

impl Engine {
    #[must_use]
    pub const fn new(assets: AssetResolver) -> Self {
        Self { assets }
    }

    /// Run every trial of `timeline`, appending records to `log`.
    ///
    /// Records collected before an abort stay in `log`. The header's
    /// `completed` flag is set when the last trial finishes.
    ///
    /// # Errors
    /// Propagates presenter failures other than an abort.
    pub fn run(
        &self,
        timeline: &Timeline,
        presenter: &mut dyn Presenter,
        log: &mut SessionLog,
    ) -> Result<Completion, StudyError> {
        let session_start = Instant::now();
        let trial_count = timeline.len();
        let mut missing_images: Vec<String> = Vec::new();

        let _span = tracing::info_span!("session", run_id = %log.header.run_id).entered();
        tracing::info!(trials = trial_count, "session started");

        for (trial_index, trial) in timeline.iter().enumerate() {
            let trial_start = Instant::now();
            let mut record = ResultRecord::new(trial_index, trial.trial_type());
            let mut lifecycle = trial.lifecycle();
            lifecycle.on_enter();
            tracing::info!(trial_index, kind = ?trial.kind(), "trial started");

            if let Trial::Preload { images } = trial {
                missing_images = self.assets.missing(images.iter().map(String::as_str));
                record.failed_images.clone_from(&missing_images);
            } else {
                let mut rejection: Option<FormError> = None;
                let response = loop {
                    let mut ctx = PresentContext {
                        trial_index,
                        trial_count,
                        rejection: rejection.as_ref(),
                        answer: lifecycle.answer_input(),
                        missing_images: &missing_images,
                        assets: &self.assets,
                    };
                    let response = match presenter.present(trial, &mut ctx) {
                        Ok(r) => r,
                        Err(StudyError::Aborted) => {
                            tracing::warn!(trial_index, "session aborted");
                            return Ok(Completion::Aborted { trial_index });
                        }
                        Err(e) => return Err(e),
                    };
                    match validate_response(trial, &response) {
                        Ok(()) => break response,
                        Err(e) => {
                            tracing::warn!(trial_index, reason = %e, "response rejected");
                            rejection = Some(e);
                        }
                    }
                };
                record.response = Some(response);
            }

            lifecycle.on_exit(&mut record);
            record.rt_ms = millis(trial_start.elapsed());
            record.time_elapsed_ms = millis(session_start.elapsed());
            tracing::info!(trial_index, rt_ms = record.rt_ms, "trial finished");
            log.push(record);
        }

        log.header.completed = true;
        tracing::info!(correct = log.correct_count(), "session finished");
        Ok(Completion::Finished)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Form answers from `(name, value)` pairs.
pub fn form<I, K, V>(pairs: I) -> Response
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Response::Form(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<BTreeMap<_, _>>(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
