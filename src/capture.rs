//! Answer capture for problem trials.
//!
//! Each problem trial owns one [`AnswerCapture`]. It holds the raw text of
//! the answer field while the trial is active and turns it into a scored
//! [`ProblemOutcome`] when the trial finishes. The buffer is emptied on
//! every finalization, and a new capture is created for every trial, so an
//! answer can never leak into the next problem.
//!
//! ```text
//!   Idle ──on_enter──▶ InputFocused ──commit──▶ Committed
//!                        │  ▲
//!                        └──┘ input_changed
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::{ProblemResult, ResultRecord};
use crate::trial::{ProblemMetadata, TrialLifecycle};

// ---------------------------------------------------------------------------
// Parsed answers
// ---------------------------------------------------------------------------

/// The participant's answer after integer parsing.
///
/// Serializes as a JSON integer, or as the string `"NaN"` when the text had
/// no leading digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticipantAnswer {
    Integer(i64),
    NotANumber,
}

impl fmt::Display for ParticipantAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::NotANumber => write!(f, "NaN"),
        }
    }
}

impl Serialize for ParticipantAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::NotANumber => serializer.serialize_str("NaN"),
        }
    }
}

impl<'de> Deserialize<'de> for ParticipantAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
            Null(()),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self::Integer(n),
            Raw::Text(s) => parse_integer(&s),
            Raw::Null(()) => Self::NotANumber,
        })
    }
}

/// Parse answer text the way a browser's `parseInt(text, 10)` does.
///
/// Leading whitespace and one sign are skipped, then the longest run of
/// ASCII digits is read. Anything after the digits is ignored, so `"12abc"`
/// and `"7651.9"` parse, while `""`, `"abc"` and `"-"` do not.
///
/// A digit run too large for `i64` is not-a-number, where `parseInt` would
/// give an imprecise float. Neither can match a catalog answer, so the
/// score is the same.
#[must_use]
pub fn parse_integer(text: &str) -> ParticipantAnswer {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return ParticipantAnswer::NotANumber;
    }

    let digits = &rest[..digits_len];
    let parsed = if negative {
        format!("-{digits}").parse::<i64>()
    } else {
        digits.parse::<i64>()
    };
    parsed.map_or(ParticipantAnswer::NotANumber, ParticipantAnswer::Integer)
}

/// Result of finalizing one problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProblemOutcome {
    pub participant_answer: ParticipantAnswer,
    pub is_correct: bool,
}

/// Score `text` against `expected`. Unparseable text is incorrect.
#[must_use]
pub fn score(text: &str, expected: i64) -> ProblemOutcome {
    let participant_answer = parse_integer(text);
    ProblemOutcome {
        participant_answer,
        is_correct: participant_answer == ParticipantAnswer::Integer(expected),
    }
}

// ---------------------------------------------------------------------------
// AnswerCapture
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// Trial created, input not wired yet.
    Idle,
    /// Input focused and listening for changes.
    InputFocused,
    /// Answer committed with the confirm key.
    Committed,
}

/// Per-trial answer buffer and its state machine.
#[derive(Debug)]
pub struct AnswerCapture {
    metadata: ProblemMetadata,
    state: CaptureState,
    buffer: Option<String>,
}

impl AnswerCapture {
    #[must_use]
    pub const fn new(metadata: ProblemMetadata) -> Self {
        Self {
            metadata,
            state: CaptureState::Idle,
            buffer: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// The last raw text seen, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        self.buffer.as_deref()
    }

    /// Focus the answer field. Only the first call has an effect.
    pub fn focus(&mut self) {
        if self.state == CaptureState::Idle {
            self.state = CaptureState::InputFocused;
            tracing::debug!(
                problem = self.metadata.problem_number,
                "answer input focused"
            );
        }
    }

    /// Record the field's current text. Ignored unless the input is wired.
    pub fn input_changed(&mut self, text: &str) {
        if self.state == CaptureState::InputFocused {
            self.buffer = Some(text.to_owned());
        }
    }

    /// Confirm-key commit. Stores `text` and returns `true` when the caller
    /// should submit the trial, exactly as a click on the submit control.
    pub fn commit(&mut self, text: &str) -> bool {
        if self.state != CaptureState::InputFocused {
            return false;
        }
        self.buffer = Some(text.to_owned());
        self.state = CaptureState::Committed;
        tracing::debug!(
            problem = self.metadata.problem_number,
            "answer committed"
        );
        true
    }

    /// Read and clear the buffer, and score what was in it.
    pub fn finalize(&mut self) -> ProblemOutcome {
        let text = self.buffer.take().unwrap_or_default();
        score(&text, self.metadata.correct_answer)
    }
}

impl TrialLifecycle for AnswerCapture {
    fn on_enter(&mut self) {
        self.focus();
    }

    fn on_exit(&mut self, record: &mut ResultRecord) {
        let outcome = self.finalize();
        tracing::info!(
            problem = self.metadata.problem_number,
            name = %self.metadata.problem_name,
            answer = %outcome.participant_answer,
            correct = outcome.is_correct,
            "problem finalized"
        );
        record.problem = Some(ProblemResult::new(&self.metadata, outcome));
    }

    fn answer_input(&mut self) -> Option<&mut AnswerCapture> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
