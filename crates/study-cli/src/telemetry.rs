//! Telemetry initialization.
//!
//! Controlled by `STUDY_LOG`:
//! - unset → no-op (tracing disabled)
//! - `"stderr"` → JSON events to stderr (garbles the interactive screen, so
//!   meant for `check`, `timeline` and `analyze`)
//! - anything else → JSON events appended to that file path
//!
//! The level filter comes from `RUST_LOG` and defaults to `info`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STUDY_LOG";

/// Where telemetry goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink<'a> {
    Off,
    Stderr,
    File(&'a Path),
}

impl<'a> Sink<'a> {
    #[must_use]
    pub fn from_setting(value: Option<&'a str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Off,
            Some("stderr") => Self::Stderr,
            Some(path) => Self::File(Path::new(path)),
        }
    }
}

/// Initialize telemetry based on `STUDY_LOG`.
pub fn init() {
    let setting = std::env::var(LOG_ENV).ok();

    match Sink::from_setting(setting.as_deref()) {
        Sink::Off => {}
        Sink::Stderr => init_stderr(),
        Sink::File(path) => init_file(path),
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON events to stderr via tracing-subscriber's JSON formatter.
fn init_stderr() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .init();
}

/// JSON events appended to a file.
fn init_file(path: &Path) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "warning: cannot open {LOG_ENV} file {}: {e}; logging disabled",
                path.display()
            );
            return;
        }
    };

    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .init();
}
