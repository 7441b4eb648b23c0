//! Study configuration (`study.toml`).
//!
//! Everything is optional. A missing file means all defaults, which run the
//! standard five-problem study with images next to the working directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{Catalog, DEFAULT_TITLE, ProblemDescriptor, standard_problems};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "study.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Parsed from `study.toml`. Missing fields use defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    #[serde(default)]
    pub study: StudySection,

    #[serde(default)]
    pub capture: CaptureConfig,

    /// Replaces the built-in problems when non-empty.
    #[serde(default)]
    pub problems: Vec<ProblemDescriptor>,
}

// ---------------------------------------------------------------------------
// StudySection
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudySection {
    /// Heading of the welcome screen.
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory problem images are resolved against.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,

    /// Directory session logs are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StudySection {
    fn default() -> Self {
        Self {
            title: default_title(),
            asset_dir: default_asset_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Only accept number characters in the answer field. Text that is not
    /// a complete number literal is recorded as empty, and so as not-a-number.
    #[serde(default = "default_numeric_only")]
    pub numeric_only: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            numeric_only: default_numeric_only(),
        }
    }
}

const fn default_numeric_only() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a study configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl StudyConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields all defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// The catalog this configuration describes.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        let problems = if self.problems.is_empty() {
            standard_problems()
        } else {
            self.problems.clone()
        };
        Catalog::new(&self.study.title, problems)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
