//! Study content: the five problems and every static screen.
//!
//! The catalog is plain data built once before the timeline. Problem order
//! is presentation order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trial::{ChoiceQuestion, Stimulus, TextQuestion};

/// Number of problems in the standard study.
pub const STANDARD_PROBLEM_COUNT: usize = 5;

pub const DEFAULT_TITLE: &str = "Program Comprehension Study";

// ---------------------------------------------------------------------------
// Problems
// ---------------------------------------------------------------------------

/// Descriptive difficulty label. Carried into results for analysis only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    #[serde(rename = "Low", alias = "low")]
    Low,
    #[serde(rename = "Medium", alias = "medium")]
    Medium,
    #[serde(rename = "Medium-High", alias = "medium-high")]
    MediumHigh,
    #[serde(rename = "High", alias = "high")]
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::MediumHigh => write!(f, "Medium-High"),
            Self::High => write!(f, "High"),
        }
    }
}

/// One problem: a code snippet image and the integer it evaluates to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemDescriptor {
    /// Image filename, resolved against the asset directory.
    pub image: String,
    pub name: String,
    pub complexity: Complexity,
    /// Expected return value of the snippet.
    pub answer: i64,
}

impl ProblemDescriptor {
    pub fn new(image: &str, name: &str, complexity: Complexity, answer: i64) -> Self {
        Self {
            image: image.to_owned(),
            name: name.to_owned(),
            complexity,
            answer,
        }
    }
}

/// The built-in problem set, in presentation order.
#[must_use]
pub fn standard_problems() -> Vec<ProblemDescriptor> {
    vec![
        ProblemDescriptor::new("problem_1.png", "GreenHouse", Complexity::Low, 7651),
        ProblemDescriptor::new("problem_2.png", "HubPool", Complexity::Medium, 954),
        ProblemDescriptor::new(
            "problem_3.png",
            "PercentageFeeModel",
            Complexity::MediumHigh,
            85,
        ),
        ProblemDescriptor::new("problem_4.png", "LockupContract", Complexity::High, 6000),
        ProblemDescriptor::new("problem_5.png", "Lock", Complexity::High, 6800),
    ]
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Everything the timeline builder needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub title: String,
    pub problems: Vec<ProblemDescriptor>,
    pub welcome: Stimulus,
    pub welcome_button: String,
    pub participant_info: Vec<TextQuestion>,
    pub demographics: Vec<ChoiceQuestion>,
    pub instructions: Stimulus,
    pub instructions_button: String,
    pub post_survey: Vec<ChoiceQuestion>,
    pub end: Stimulus,
    pub end_button: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, standard_problems())
    }
}

impl Catalog {
    /// Build the catalog around a problem list. Screen texts that mention
    /// the number of problems follow `problems.len()`.
    #[must_use]
    pub fn new(title: &str, problems: Vec<ProblemDescriptor>) -> Self {
        let count = problems.len();
        Self {
            title: title.to_owned(),
            welcome: welcome_stimulus(title, count),
            welcome_button: "I Agree".to_owned(),
            participant_info: participant_info_questions(),
            demographics: demographic_questions(),
            instructions: instructions_stimulus(count),
            instructions_button: "Start".to_owned(),
            post_survey: post_survey_questions(),
            end: end_stimulus(),
            end_button: "Finish".to_owned(),
            problems,
        }
    }

    /// Check the problem list for mistakes that would corrupt the data.
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();

        if self.problems.len() != STANDARD_PROBLEM_COUNT {
            issues.push(CatalogIssue::UnexpectedCount {
                found: self.problems.len(),
            });
        }

        let mut images = BTreeSet::new();
        let mut names = BTreeSet::new();
        for (i, p) in self.problems.iter().enumerate() {
            let number = i + 1;
            if !images.insert(p.image.as_str()) {
                issues.push(CatalogIssue::DuplicateImage {
                    number,
                    image: p.image.clone(),
                });
            }
            if !names.insert(p.name.as_str()) {
                issues.push(CatalogIssue::DuplicateName {
                    number,
                    name: p.name.clone(),
                });
            }
            if p.answer < 0 {
                issues.push(CatalogIssue::NegativeAnswer {
                    number,
                    answer: p.answer,
                });
            }
        }
        issues
    }

    /// Image references in presentation order.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.problems.iter().map(|p| p.image.as_str())
    }
}

/// A problem found by [`Catalog::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogIssue {
    /// Not the standard five problems. Allowed, but results will not line
    /// up with other sessions.
    UnexpectedCount { found: usize },
    DuplicateImage { number: usize, image: String },
    DuplicateName { number: usize, name: String },
    NegativeAnswer { number: usize, answer: i64 },
}

impl CatalogIssue {
    /// Whether the issue only warrants a warning.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::UnexpectedCount { .. })
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCount { found } => write!(
                f,
                "catalog has {found} problem(s); the standard study uses {STANDARD_PROBLEM_COUNT}"
            ),
            Self::DuplicateImage { number, image } => {
                write!(f, "problem {number} reuses image '{image}'")
            }
            Self::DuplicateName { number, name } => {
                write!(f, "problem {number} reuses name '{name}'")
            }
            Self::NegativeAnswer { number, answer } => {
                write!(f, "problem {number} expects a negative answer ({answer})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Static screens
// ---------------------------------------------------------------------------

fn welcome_stimulus(title: &str, count: usize) -> Stimulus {
    Stimulus::new()
        .heading(title)
        .paragraph("Thank you for participating in this study.")
        .paragraph(format!(
            "In this experiment, you will be shown **{count} code snippets** with input values. \
             Your task is to **calculate the return value** of each function."
        ))
        .paragraph("**Important:**")
        .bullets([
            "You may use a calculator for arithmetic operations.",
            "Take your time to understand the code before answering.",
            "Your response time will be recorded.",
        ])
        .paragraph("The study takes approximately **15-20 minutes**.")
        .paragraph("By selecting \"I Agree\", you consent to participate in this study.")
}

fn participant_info_questions() -> Vec<TextQuestion> {
    vec![
        TextQuestion {
            prompt: "Name".to_owned(),
            name: "name".to_owned(),
            required: true,
            placeholder: Some("Enter your name".to_owned()),
        },
        TextQuestion {
            prompt: "Email".to_owned(),
            name: "email".to_owned(),
            required: true,
            placeholder: Some("Enter your email".to_owned()),
        },
    ]
}

fn choice(prompt: &str, name: &str, options: &[&str]) -> ChoiceQuestion {
    ChoiceQuestion {
        prompt: prompt.to_owned(),
        name: name.to_owned(),
        options: options.iter().map(|&o| o.to_owned()).collect(),
        required: true,
    }
}

/// Programming experience options, in display order.
pub const PROGRAMMING_EXPERIENCE: [&str; 4] = [
    "Less than 1 year",
    "1-2 years",
    "3-5 years",
    "More than 5 years",
];

/// Solidity experience options, in display order.
pub const SOLIDITY_EXPERIENCE: [&str; 4] = [
    "None",
    "Beginner (read some code)",
    "Intermediate (written some contracts)",
    "Advanced (deployed contracts)",
];

fn demographic_questions() -> Vec<ChoiceQuestion> {
    vec![
        choice(
            "How many years of programming experience do you have?",
            "programming_exp",
            &PROGRAMMING_EXPERIENCE,
        ),
        choice(
            "What is your experience level with Solidity or smart contracts?",
            "solidity_exp",
            &SOLIDITY_EXPERIENCE,
        ),
        choice(
            "What is your current role?",
            "role",
            &[
                "Undergraduate Student",
                "Graduate Student",
                "Software Developer",
                "Researcher",
                "Professor",
                "Other",
            ],
        ),
    ]
}

fn instructions_stimulus(count: usize) -> Stimulus {
    Stimulus::new()
        .heading("Instructions")
        .paragraph(format!("You will now see {count} problems. For each problem:"))
        .numbered([
            "Read the code carefully",
            "Note the input values provided",
            "Calculate the return value of the function",
            "Enter your answer in the field below the code",
            "Press Enter (or select \"Submit\") when ready",
        ])
        .paragraph(
            "**Note:** Enter only the numeric value (e.g., 1234), not variable names or expressions.",
        )
        .paragraph("Select \"Start\" when you are ready.")
}

fn post_survey_questions() -> Vec<ChoiceQuestion> {
    vec![choice(
        "Which tool or method did you primarily use to solve the problems?",
        "tools_used",
        &[
            "Mental calculation only (no tools)",
            "Calculator",
            "AI (e.g., ChatGPT, Claude, Copilot)",
            "Solidity IDE/Debugger (e.g., Remix, Hardhat)",
            "Pen and paper",
            "Other",
        ],
    )]
}

fn end_stimulus() -> Stimulus {
    Stimulus::new()
        .heading("Thank You!")
        .paragraph("Your responses have been recorded.")
        .paragraph("Thank you for participating in this study.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
