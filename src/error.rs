//! Study error types.
//!
//! Defines [`StudyError`], the error type for everything outside the
//! scoring path. Scoring itself never fails: malformed answers become
//! not-a-number and are recorded as incorrect (see [`crate::capture`]).
//!
//! Messages follow one shape: what went wrong, then a `To fix:` line.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// StudyError
// ---------------------------------------------------------------------------

/// Unified error type for loading, running and exporting a study.
#[derive(Debug)]
pub enum StudyError {
    /// A configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file (empty when parsed from a string).
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// A session log line could not be parsed.
    MalformedLog {
        /// The log file being read.
        path: PathBuf,
        /// 1-based line number of the bad line.
        line: usize,
        /// Parser message.
        detail: String,
    },

    /// The presenter failed to show a trial (terminal I/O, drawing).
    Presentation(String),

    /// The participant aborted the session.
    Aborted,

    /// An I/O error occurred while reading or writing study files.
    Io(std::io::Error),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for StudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                    path.display()
                )
            }
            Self::MalformedLog { path, line, detail } => {
                write!(
                    f,
                    "malformed session log '{}' at line {line}: {detail}\n  To fix: make sure the file was written by `study run` and was not edited by hand.",
                    path.display()
                )
            }
            Self::Presentation(detail) => {
                write!(
                    f,
                    "could not present trial: {detail}\n  To fix: run the study in an interactive terminal of at least 80x24."
                )
            }
            Self::Aborted => write!(f, "session aborted by participant"),
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file permissions and disk space."
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for StudyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<std::io::Error> for StudyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<crate::config::ConfigError> for StudyError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config {
            path: err.path.unwrap_or_default(),
            detail: err.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_config_error_names_path() {
        let err = StudyError::Config {
            path: PathBuf::from("study.toml"),
            detail: "line 3: unknown field `foo`".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("study.toml"));
        assert!(msg.contains("unknown field"));
        assert!(msg.contains("To fix"));
    }

    #[test]
    fn display_malformed_log_includes_line() {
        let err = StudyError::MalformedLog {
            path: PathBuf::from("results/session-ab.jsonl"),
            line: 7,
            detail: "expected value".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("session-ab.jsonl"));
        assert!(msg.contains("line 7"));
    }

    #[test]
    fn aborted_has_no_fix_hint() {
        assert_eq!(StudyError::Aborted.to_string(), "session aborted by participant");
    }

    #[test]
    fn io_error_is_source() {
        let err = StudyError::from(std::io::Error::other("disk gone"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn config_error_converts() {
        let cfg = crate::config::ConfigError {
            path: Some(PathBuf::from("x.toml")),
            message: "bad".to_owned(),
        };
        let err: StudyError = cfg.into();
        match err {
            StudyError::Config { path, detail } => {
                assert_eq!(path, PathBuf::from("x.toml"));
                assert_eq!(detail, "bad");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
