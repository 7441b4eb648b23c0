use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use study::Timeline;
use study::config::{CONFIG_FILE, StudyConfig};

mod analyze;
mod check;
mod format;
mod run;
mod telemetry;
mod timeline;

use format::OutputFormat;

/// Program-comprehension study runner
///
/// Presents code-reading problems in the terminal, records each answer
/// with its timing, and writes one JSONL log per session.
///
/// QUICK START:
///
///   study check                  # verify config and problem images
///   study run                    # run one participant session
///   study analyze results/       # summarize all saved sessions
///
/// Set STUDY_LOG to a file path (or "stderr") for JSON diagnostics.
#[derive(Parser)]
#[command(name = "study")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'study <command> --help' for more information on a specific command.")]
struct Cli {
    /// Study configuration file
    #[arg(long, global = true, env = "STUDY_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one participant session
    ///
    /// Shows the welcome screen, surveys, the problems with a break after
    /// each, and the closing survey. Ctrl-C ends the session early; the
    /// answers given so far are still saved.
    Run {
        /// Directory problem images are resolved against
        #[arg(long)]
        asset_dir: Option<PathBuf>,

        /// Directory session logs are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the presentation plan without running it
    Timeline {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check configuration, catalog and image assets
    Check {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Summarize saved session logs
    ///
    /// Accepts session-*.jsonl files and directories containing them.
    Analyze {
        /// Session log files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            asset_dir,
            output_dir,
        } => {
            let config = StudyConfig::load(&cli.config)?;
            run::run(
                config,
                &run::RunOptions {
                    asset_dir,
                    output_dir,
                },
            )
        }
        Commands::Timeline { format } => {
            let config = StudyConfig::load(&cli.config)?;
            timeline::run(&Timeline::build(&config.catalog()), format)
        }
        Commands::Check { format } => check::run(&cli.config, format),
        Commands::Analyze { paths, format } => analyze::run(&paths, format),
    }
}
