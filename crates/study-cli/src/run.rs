use std::path::PathBuf;

use anyhow::Result;
use study::assets::AssetResolver;
use study::config::StudyConfig;
use study::record::SessionHeader;
use study::{Catalog, Completion, Engine, SessionLog, Timeline};

/// Command-line overrides for `study run`.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub asset_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl RunOptions {
    fn apply(&self, config: &mut StudyConfig) {
        if let Some(dir) = &self.asset_dir {
            config.study.asset_dir.clone_from(dir);
        }
        if let Some(dir) = &self.output_dir {
            config.study.output_dir.clone_from(dir);
        }
    }
}

/// Run one participant session in the terminal and save its log.
///
/// The log is written even when the participant quits or the terminal
/// fails, so partial sessions are never lost.
pub fn run(mut config: StudyConfig, options: &RunOptions) -> Result<()> {
    options.apply(&mut config);

    let catalog = config.catalog();
    for line in catalog_errors(&catalog) {
        eprintln!("{line}");
    }

    let timeline = Timeline::build(&catalog);
    let mut log = SessionLog::new(SessionHeader::start(
        &catalog.title,
        &timeline.fingerprint(),
    ));
    let engine = Engine::new(AssetResolver::new(&config.study.asset_dir));

    let outcome = study_tui::run_session(
        &engine,
        &timeline,
        &mut log,
        config.capture.numeric_only,
    );

    let path = log.save(&config.study.output_dir)?;
    let answered = log.problems().count();
    println!("Saved {} record(s) to {}", log.records.len(), path.display());

    match outcome? {
        Completion::Finished => {
            println!(
                "Session complete: {}/{} correct",
                log.correct_count(),
                answered
            );
        }
        Completion::Aborted { trial_index } => {
            println!(
                "Session stopped at step {trial_index}; {answered} problem(s) answered"
            );
        }
    }
    Ok(())
}

/// Log every catalog issue and return console lines for the ones
/// `study check` fails on.
fn catalog_errors(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    for issue in catalog.validate() {
        if issue.is_warning() {
            tracing::warn!(%issue, "catalog");
        } else {
            tracing::error!(%issue, "catalog");
            lines.push(format!("error: {issue}"));
        }
    }
    lines
}
