//! Trial records: the unit the timeline is made of.
//!
//! A [`Trial`] is plain data describing one screen: what to show and what
//! kind of response to accept. Runtime state lives elsewhere. Each trial
//! hands out a fresh [`TrialLifecycle`] object when it starts
//! (see [`Trial::lifecycle`]), so nothing carries over between trials.

use serde::{Deserialize, Serialize};

use crate::capture::AnswerCapture;
use crate::catalog::Complexity;
use crate::record::ResultRecord;

// ---------------------------------------------------------------------------
// Stimulus content
// ---------------------------------------------------------------------------

/// One block of presented content.
///
/// Paragraph and list text may contain `**emphasis**` markers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Heading(String),
    Subheading(String),
    Paragraph(String),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    /// Small muted caption, e.g. "Problem 2 of 5".
    Caption(String),
    /// An external image referenced by filename.
    Image(String),
}

/// Ordered content blocks shown by a trial.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub blocks: Vec<Block>,
}

impl Stimulus {
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    #[must_use]
    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    #[must_use]
    pub fn subheading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Subheading(text.into()));
        self
    }

    #[must_use]
    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    #[must_use]
    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks
            .push(Block::Bullets(items.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn numbered<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks
            .push(Block::Numbered(items.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn caption(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Caption(text.into()));
        self
    }

    #[must_use]
    pub fn image(mut self, reference: impl Into<String>) -> Self {
        self.blocks.push(Block::Image(reference.into()));
        self
    }

    /// First heading, used as a one-line summary.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading(t) | Block::Subheading(t) => Some(t.as_str()),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Survey questions
// ---------------------------------------------------------------------------

/// A free-text field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuestion {
    pub prompt: String,
    /// Key under which the answer is recorded.
    pub name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// A single-select question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    pub prompt: String,
    pub name: String,
    pub options: Vec<String>,
    pub required: bool,
}

// ---------------------------------------------------------------------------
// Trials
// ---------------------------------------------------------------------------

/// Discriminant of [`Trial`], for comparing timeline shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    Preload,
    Informational,
    FreeTextSurvey,
    MultipleChoiceSurvey,
    Problem,
    Break,
}

/// A screen with content and a row of buttons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonTrial {
    pub stimulus: Stimulus,
    pub choices: Vec<String>,
}

/// Metadata attached to every problem trial and copied into its result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemMetadata {
    /// Always `"problem"`; lets analysis tell problem rows apart.
    pub task: String,
    pub problem_name: String,
    /// 1-based presentation position.
    pub problem_number: usize,
    pub complexity: Complexity,
    pub correct_answer: i64,
}

/// A code-comprehension problem with a numeric answer field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemTrial {
    pub stimulus: Stimulus,
    /// Image reference of the code snippet.
    pub image: String,
    pub input_label: String,
    pub input_placeholder: String,
    pub choices: Vec<String>,
    pub metadata: ProblemMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trial {
    /// Resolve image assets before anything is shown.
    Preload { images: Vec<String> },
    Informational(ButtonTrial),
    FreeTextSurvey { questions: Vec<TextQuestion> },
    MultipleChoiceSurvey { questions: Vec<ChoiceQuestion> },
    Problem(ProblemTrial),
    Break(ButtonTrial),
}

impl Trial {
    #[must_use]
    pub const fn kind(&self) -> TrialKind {
        match self {
            Self::Preload { .. } => TrialKind::Preload,
            Self::Informational(_) => TrialKind::Informational,
            Self::FreeTextSurvey { .. } => TrialKind::FreeTextSurvey,
            Self::MultipleChoiceSurvey { .. } => TrialKind::MultipleChoiceSurvey,
            Self::Problem(_) => TrialKind::Problem,
            Self::Break(_) => TrialKind::Break,
        }
    }

    /// Name of the response type recorded in the data log.
    #[must_use]
    pub const fn trial_type(&self) -> &'static str {
        match self {
            Self::Preload { .. } => "preload",
            Self::Informational(_) | Self::Problem(_) | Self::Break(_) => "html-button-response",
            Self::FreeTextSurvey { .. } => "survey-text",
            Self::MultipleChoiceSurvey { .. } => "survey-multi-choice",
        }
    }

    /// Button labels, empty for form and preload trials.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        match self {
            Self::Informational(b) | Self::Break(b) => &b.choices,
            Self::Problem(p) => &p.choices,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn problem(&self) -> Option<&ProblemTrial> {
        match self {
            Self::Problem(p) => Some(p),
            _ => None,
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Preload { images } => format!("{} image(s)", images.len()),
            Self::Informational(b) | Self::Break(b) => format!(
                "{} [{}]",
                b.stimulus.title().unwrap_or("(untitled)"),
                b.choices.join(", ")
            ),
            Self::FreeTextSurvey { questions } => {
                let names: Vec<&str> = questions.iter().map(|q| q.name.as_str()).collect();
                format!("fields: {}", names.join(", "))
            }
            Self::MultipleChoiceSurvey { questions } => {
                let names: Vec<&str> = questions.iter().map(|q| q.name.as_str()).collect();
                format!("questions: {}", names.join(", "))
            }
            Self::Problem(p) => format!(
                "#{} {} ({}) answer={} image={}",
                p.metadata.problem_number,
                p.metadata.problem_name,
                p.metadata.complexity,
                p.metadata.correct_answer,
                p.image
            ),
        }
    }

    /// Fresh per-trial state for one presentation of this trial.
    #[must_use]
    pub fn lifecycle(&self) -> Box<dyn TrialLifecycle> {
        match self {
            Self::Problem(p) => Box::new(AnswerCapture::new(p.metadata.clone())),
            _ => Box::new(StaticLifecycle),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle hooks
// ---------------------------------------------------------------------------

/// Two-phase lifecycle of a running trial.
///
/// The engine calls `on_enter` once before presenting and `on_exit` once
/// after the response is accepted, whichever way it was submitted.
pub trait TrialLifecycle {
    fn on_enter(&mut self);

    /// Merge trial-specific fields into the result record.
    fn on_exit(&mut self, record: &mut ResultRecord);

    /// The answer field, for trials that have one.
    fn answer_input(&mut self) -> Option<&mut AnswerCapture> {
        None
    }
}

/// Lifecycle of trials without computed behaviour.
#[derive(Debug, Default)]
pub struct StaticLifecycle;

impl TrialLifecycle for StaticLifecycle {
    fn on_enter(&mut self) {}

    fn on_exit(&mut self, _record: &mut ResultRecord) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
