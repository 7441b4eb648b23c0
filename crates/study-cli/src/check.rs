use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;
use study::assets::AssetResolver;
use study::config::StudyConfig;
use study::{Catalog, Timeline};

use crate::format::OutputFormat;

#[derive(Serialize)]
struct CheckEnvelope {
    checks: Vec<StudyCheck>,
    all_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Serialize)]
struct StudyCheck {
    name: String,
    status: Status,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

impl StudyCheck {
    fn new(name: &str, status: Status, message: String) -> Self {
        Self {
            name: name.to_owned(),
            status,
            message,
            fix: None,
        }
    }

    fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

fn print_check(check: &StudyCheck) {
    let prefix = match check.status {
        Status::Ok => "[OK]",
        Status::Warn => "[WARN]",
        Status::Fail => "[FAIL]",
    };
    println!("{} {}", prefix, check.message);
    if let Some(fix) = &check.fix {
        println!("       {fix}");
    }
}

/// Check that a study can run: config, catalog, images, output directory.
pub fn run(config_path: &Path, format: OutputFormat) -> Result<()> {
    let checks = collect(config_path);
    let all_ok = checks.iter().all(|c| c.status != Status::Fail);

    match format {
        OutputFormat::Json => {
            let envelope = CheckEnvelope {
                checks,
                all_ok,
            };
            println!("{}", format.serialize(&envelope)?);
        }
        OutputFormat::Text => {
            println!("study check");
            println!("===========");
            println!();

            for check in &checks {
                print_check(check);
            }

            println!();
            if all_ok {
                println!("All checks passed!");
            } else {
                println!("Some checks failed. See above for details.");
            }
        }
    }

    if !all_ok {
        bail!("study check failed");
    }
    Ok(())
}

fn collect(config_path: &Path) -> Vec<StudyCheck> {
    let (config, config_check) = check_config(config_path);
    let mut checks = vec![config_check];
    let Some(config) = config else {
        return checks;
    };

    let catalog = config.catalog();
    checks.extend(check_catalog(&catalog));
    checks.push(check_timeline(&catalog));
    checks.extend(check_images(
        &catalog,
        &AssetResolver::new(&config.study.asset_dir),
    ));
    checks.push(check_output_dir(&config.study.output_dir));
    checks
}

fn check_config(path: &Path) -> (Option<StudyConfig>, StudyCheck) {
    if !path.exists() {
        return (
            Some(StudyConfig::default()),
            StudyCheck::new(
                "config",
                Status::Ok,
                format!("config: {} not found, using defaults", path.display()),
            ),
        );
    }
    match StudyConfig::load(path) {
        Ok(config) => (
            Some(config),
            StudyCheck::new(
                "config",
                Status::Ok,
                format!("config: {} loaded", path.display()),
            ),
        ),
        Err(e) => (
            None,
            StudyCheck::new("config", Status::Fail, format!("config: {e}"))
                .with_fix(format!("Fix the file or remove it to use defaults: {}", path.display())),
        ),
    }
}

fn check_catalog(catalog: &Catalog) -> Vec<StudyCheck> {
    let issues = catalog.validate();
    if issues.is_empty() {
        return vec![StudyCheck::new(
            "catalog",
            Status::Ok,
            format!("catalog: {} problem(s)", catalog.problems.len()),
        )];
    }
    issues
        .iter()
        .map(|issue| {
            let status = if issue.is_warning() {
                Status::Warn
            } else {
                Status::Fail
            };
            StudyCheck::new("catalog", status, format!("catalog: {issue}"))
        })
        .collect()
}

fn check_timeline(catalog: &Catalog) -> StudyCheck {
    let timeline = Timeline::build(catalog);
    StudyCheck::new(
        "timeline",
        Status::Ok,
        format!(
            "timeline: {} trial(s), fingerprint {}",
            timeline.len(),
            &timeline.fingerprint()[..12]
        ),
    )
}

fn check_images(catalog: &Catalog, assets: &AssetResolver) -> Vec<StudyCheck> {
    assets
        .check(catalog.images())
        .into_iter()
        .map(|status| {
            if status.found {
                StudyCheck::new(
                    "image",
                    Status::Ok,
                    format!("image: {}", status.path.display()),
                )
            } else {
                StudyCheck::new(
                    "image",
                    Status::Warn,
                    format!("image: {} missing", status.path.display()),
                )
                .with_fix(format!(
                    "Place {} in {} or set [study] asset_dir",
                    status.image,
                    assets.root().display()
                ))
            }
        })
        .collect()
}

fn check_output_dir(dir: &Path) -> StudyCheck {
    if dir.is_dir() {
        StudyCheck::new(
            "output_dir",
            Status::Ok,
            format!("output: {} exists", dir.display()),
        )
    } else if dir.exists() {
        StudyCheck::new(
            "output_dir",
            Status::Fail,
            format!("output: {} is not a directory", dir.display()),
        )
        .with_fix("Set [study] output_dir to a directory")
    } else {
        StudyCheck::new(
            "output_dir",
            Status::Ok,
            format!("output: {} will be created", dir.display()),
        )
    }
}
