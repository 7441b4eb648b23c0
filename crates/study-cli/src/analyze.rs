use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use study::SessionLog;
use study::analysis::{Analysis, CategoryCount, GroupAccuracy};

use crate::format::OutputFormat;

/// Summarize session logs: accuracy, response time, tools, experience.
pub fn run(paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    let files = expand(paths)?;
    if files.is_empty() {
        bail!("no session logs found\n  To fix: pass session-*.jsonl files or a results directory");
    }

    let mut logs = Vec::with_capacity(files.len());
    for file in &files {
        let log = SessionLog::load(file).with_context(|| format!("loading {}", file.display()))?;
        tracing::debug!(path = %file.display(), records = log.records.len(), "session log loaded");
        logs.push(log);
    }

    let analysis = Analysis::from_logs(&logs);
    tracing::info!(
        sessions = logs.len(),
        responses = analysis.total_responses,
        "analysis complete"
    );

    match format {
        OutputFormat::Json => println!("{}", format.serialize(&analysis)?),
        OutputFormat::Text => print!("{}", render_text(&analysis, logs.len())),
    }
    Ok(())
}

/// Directories contribute their `*.jsonl` files, sorted by name.
fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("reading {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_session_log(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_session_log(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl")
}

fn render_text(analysis: &Analysis, sessions: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "study analysis");
    let _ = writeln!(out, "==============");
    let _ = writeln!(out);
    let _ = writeln!(out, "Sessions:        {sessions}");
    let _ = writeln!(out, "Participants:    {}", analysis.participants);
    let _ = writeln!(out, "Responses:       {}", analysis.total_responses);
    let _ = writeln!(
        out,
        "Accuracy:        {}/{} ({:.1}%)",
        analysis.correct, analysis.total_responses, analysis.accuracy_pct
    );
    let _ = writeln!(
        out,
        "Response time:   mean {:.1}s, median {:.1}s",
        analysis.mean_secs, analysis.median_secs
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Per problem");
    let _ = writeln!(out, "-----------");
    for p in &analysis.per_problem {
        let _ = writeln!(
            out,
            "  {:>2}. {:<20} {:>3}/{:<3} {:>5.1}%  mean {:>6.1}s  median {:>6.1}s",
            p.problem_number,
            p.problem_name,
            p.correct,
            p.total,
            p.accuracy_pct,
            p.mean_secs,
            p.median_secs
        );
    }

    section_counts(&mut out, "Tools used", &analysis.tool_usage);
    section_groups(&mut out, "Accuracy by tool", &analysis.accuracy_by_tool);
    section_groups(
        &mut out,
        "Accuracy by programming experience",
        &analysis.by_programming_experience,
    );
    section_groups(
        &mut out,
        "Accuracy by Solidity experience",
        &analysis.by_solidity_experience,
    );
    section_counts(&mut out, "Roles", &analysis.roles);
    out
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
}

fn section_counts(out: &mut String, title: &str, counts: &[CategoryCount]) {
    heading(out, title);
    if counts.is_empty() {
        let _ = writeln!(out, "  (no answers)");
    }
    for c in counts {
        let _ = writeln!(out, "  {:<45} {:>3} ({:.1}%)", c.label, c.count, c.pct);
    }
}

fn section_groups(out: &mut String, title: &str, groups: &[GroupAccuracy]) {
    heading(out, title);
    if groups.is_empty() {
        let _ = writeln!(out, "  (no answers)");
    }
    for g in groups {
        let _ = writeln!(
            out,
            "  {:<45} {:>3}/{:<3} {:>5.1}%  n={}  mean {:.1}s",
            g.label, g.correct, g.total, g.accuracy_pct, g.participants, g.mean_secs
        );
    }
}
