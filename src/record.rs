//! Result records and session logs.
//!
//! The engine appends one [`ResultRecord`] per trial. A [`SessionLog`] is
//! those records plus a [`SessionHeader`], stored as JSON Lines: the header
//! on the first line, then one record per line in presentation order.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::capture::{ParticipantAnswer, ProblemOutcome};
use crate::catalog::Complexity;
use crate::error::StudyError;
use crate::trial::ProblemMetadata;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What the participant did to leave a trial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// Index of the button pressed.
    Button(usize),
    /// Form answers keyed by question name.
    Form(BTreeMap<String, String>),
}

impl Response {
    /// Value of one form field, if this is a form response.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Form(values) => values.get(name).map(String::as_str),
            Self::Button(_) => None,
        }
    }
}

/// Problem fields merged into a record when a problem trial finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemResult {
    pub task: String,
    pub problem_name: String,
    pub problem_number: usize,
    pub complexity: Complexity,
    pub correct_answer: i64,
    pub participant_answer: ParticipantAnswer,
    pub is_correct: bool,
}

impl ProblemResult {
    #[must_use]
    pub fn new(metadata: &ProblemMetadata, outcome: ProblemOutcome) -> Self {
        Self {
            task: metadata.task.clone(),
            problem_name: metadata.problem_name.clone(),
            problem_number: metadata.problem_number,
            complexity: metadata.complexity,
            correct_answer: metadata.correct_answer,
            participant_answer: outcome.participant_answer,
            is_correct: outcome.is_correct,
        }
    }
}

/// One row of the data log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 0-based position in the timeline.
    pub trial_index: usize,
    pub trial_type: String,
    /// Time from presentation to response.
    pub rt_ms: u64,
    /// Time from session start to the end of this trial.
    pub time_elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<ProblemResult>,
    /// Images the preload step could not find.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_images: Vec<String>,
}

impl ResultRecord {
    #[must_use]
    pub fn new(trial_index: usize, trial_type: &str) -> Self {
        Self {
            trial_index,
            trial_type: trial_type.to_owned(),
            rt_ms: 0,
            time_elapsed_ms: 0,
            response: None,
            problem: None,
            failed_images: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session log
// ---------------------------------------------------------------------------

/// First line of a session log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    /// Random 16-hex-digit id of this run.
    pub run_id: String,
    pub started_at_unix: u64,
    pub study_title: String,
    /// Fingerprint of the timeline the session ran.
    pub timeline_fingerprint: String,
    /// `false` when the participant aborted before the end screen.
    #[serde(default)]
    pub completed: bool,
}

impl SessionHeader {
    /// Header for a session starting now, with a fresh run id.
    #[must_use]
    pub fn start(study_title: &str, timeline_fingerprint: &str) -> Self {
        let started_at_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            run_id: format!("{:016x}", rand::random::<u64>()),
            started_at_unix,
            study_title: study_title.to_owned(),
            timeline_fingerprint: timeline_fingerprint.to_owned(),
            completed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLog {
    pub header: SessionHeader,
    pub records: Vec<ResultRecord>,
}

impl SessionLog {
    #[must_use]
    pub const fn new(header: SessionHeader) -> Self {
        Self {
            header,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    /// Records of problem trials, with their problem fields.
    pub fn problems(&self) -> impl Iterator<Item = (&ResultRecord, &ProblemResult)> {
        self.records
            .iter()
            .filter_map(|r| r.problem.as_ref().map(|p| (r, p)))
    }

    /// First form answer recorded under `name`.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .filter_map(|r| r.response.as_ref())
            .find_map(|resp| resp.field(name))
    }

    /// Number of correctly answered problems.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.problems().filter(|(_, p)| p.is_correct).count()
    }

    /// File name used when saving into an output directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("session-{}.jsonl", self.header.run_id)
    }

    /// Write the log as JSON Lines.
    ///
    /// # Errors
    /// Returns an I/O error if the writer fails.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer(&mut writer, &self.header)?;
        writer.write_all(b"\n")?;
        for record in &self.records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Save into `dir` (created if missing). Returns the file path.
    ///
    /// # Errors
    /// Returns `StudyError::Io` if the directory or file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, StudyError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let file = fs::File::create(&path)?;
        self.write_jsonl(io::BufWriter::new(file))?;
        tracing::info!(path = %path.display(), records = self.records.len(), "session log saved");
        Ok(path)
    }

    /// Read a log written by [`SessionLog::write_jsonl`]. Blank lines are
    /// skipped.
    ///
    /// # Errors
    /// Returns `StudyError::MalformedLog` for a missing header or a bad line.
    pub fn read_jsonl<R: BufRead>(reader: R, path: &Path) -> Result<Self, StudyError> {
        let malformed = |line: usize, detail: String| StudyError::MalformedLog {
            path: path.to_owned(),
            line,
            detail,
        };

        let mut header: Option<SessionHeader> = None;
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let number = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            if header.is_none() {
                header = Some(
                    serde_json::from_str(&line).map_err(|e| malformed(number, e.to_string()))?,
                );
            } else {
                records.push(
                    serde_json::from_str(&line).map_err(|e| malformed(number, e.to_string()))?,
                );
            }
        }

        let header = header.ok_or_else(|| malformed(1, "missing session header".to_owned()))?;
        Ok(Self { header, records })
    }

    /// Load a log file from disk.
    ///
    /// # Errors
    /// Returns `StudyError::Io` if unreadable, `MalformedLog` if unparsable.
    pub fn load(path: &Path) -> Result<Self, StudyError> {
        let file = fs::File::open(path)?;
        Self::read_jsonl(BufReader::new(file), path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
