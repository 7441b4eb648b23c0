use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;
use study::{Timeline, Trial};

use crate::format::OutputFormat;

#[derive(Serialize)]
struct TimelineEnvelope<'a> {
    fingerprint: String,
    trials: &'a [Trial],
}

/// Print the presentation plan without running it.
pub fn run(timeline: &Timeline, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let envelope = TimelineEnvelope {
                fingerprint: timeline.fingerprint(),
                trials: timeline.trials(),
            };
            println!("{}", format.serialize(&envelope)?);
        }
        OutputFormat::Text => print!("{}", render_text(timeline)),
    }
    Ok(())
}

fn render_text(timeline: &Timeline) -> String {
    let mut out = String::new();
    for (index, trial) in timeline.iter().enumerate() {
        let _ = writeln!(
            out,
            "{index:>3}  {:<22} {}",
            trial.trial_type(),
            trial.summary()
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} trials, {} problems, fingerprint {}",
        timeline.len(),
        timeline.problem_count(),
        timeline.fingerprint()
    );
    out
}
