//! CLI command definitions and handlers

mod history;
mod record;
mod reset;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::history::{BuildStatus, HistoryStore};

fn parse_build_status(s: &str) -> Result<BuildStatus, String> {
    s.parse()
}

/// Warngate - track static-analysis warnings across CI builds
#[derive(Parser, Debug)]
#[command(name = "warngate")]
#[command(
    version,
    about = "Track static-analysis warnings across builds: new, fixed and outstanding issues, quality gates and health",
    long_about = "Warngate fingerprints the issues reported by your analysis tools, compares them \
with a reference build from the run history, and evaluates quality gates and a health score.\n\n\
Issue files are JSON, either an array of issues or an object with an \"issues\" array.",
    after_help = "\
Examples:
  warngate record --job app --build 42 --issues gcc.json    Evaluate build 42
  warngate record --job app --issues *.json --format json  JSON output for scripting
  warngate history --job app                               List recorded runs
  warngate reset --job app --build 41 --id gcc             Accept #41 as reference despite its gate"
)]
pub struct Cli {
    /// Workspace root that issue file names are relative to
    #[arg(long, short = 'w', global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Run history file (default: ~/.cache/warngate/<workspace>/history.json)
    #[arg(long, global = true, env = "WARNGATE_STORE")]
    pub store: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the issues of one build and record it in the history
    #[command(after_help = "\
Examples:
  warngate record --job app --build 7 --issues gcc.json pmd.json
  warngate record --job feature --reference-job main --issues gcc.json
  warngate record --job app --status unstable --issues gcc.json --fail-on-unstable
  warngate record --job app --issues gcc.json --dry-run          Evaluate without recording")]
    Record {
        /// Job the build belongs to
        #[arg(long, env = "WARNGATE_JOB")]
        job: String,

        /// Build number (default: one past the latest recorded build)
        #[arg(long)]
        build: Option<u64>,

        /// Result of the build itself before quality gates
        #[arg(long, default_value = "success", value_parser = parse_build_status)]
        status: BuildStatus,

        /// Normalized issue files, one per tool
        #[arg(long, num_args = 1..)]
        issues: Vec<PathBuf>,

        /// Config file (default: warngate.toml or .warngaterc.json in the workspace)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Take the reference from this job instead of the current one
        #[arg(long)]
        reference_job: Option<String>,

        /// Use exactly this build of the reference job
        #[arg(long)]
        reference_build: Option<u64>,

        /// Only accept reference builds whose quality gate passed
        #[arg(long)]
        require_passed_gate: bool,

        /// Only accept reference builds whose overall result is SUCCESS
        #[arg(long)]
        require_success: bool,

        /// Analysis id used to match reference resets
        #[arg(long)]
        id: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also exit with code 1 when the quality gate result is WARNING
        #[arg(long)]
        fail_on_unstable: bool,

        /// Evaluate without recording the run
        #[arg(long)]
        dry_run: bool,
    },

    /// List recorded runs
    History {
        /// Only show this job
        #[arg(long)]
        job: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Accept a run as reference even though its quality gate was missed
    Reset {
        #[arg(long)]
        job: String,

        #[arg(long)]
        build: u64,

        /// Analysis id the reset applies to
        #[arg(long)]
        id: String,
    },

    /// Show version information
    Version,
}

/// History store for the given workspace and optional override.
fn open_store(workspace: &Path, store: Option<&Path>) -> HistoryStore {
    match store {
        Some(path) => HistoryStore::new(path),
        None => HistoryStore::new(crate::cache::get_history_path(workspace)),
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let workspace = cli
        .workspace
        .canonicalize()
        .with_context(|| format!("Workspace does not exist: {}", cli.workspace.display()))?;
    let store = open_store(&workspace, cli.store.as_deref());

    match cli.command {
        Commands::Record {
            job,
            build,
            status,
            issues,
            config,
            reference_job,
            reference_build,
            require_passed_gate,
            require_success,
            id,
            format,
            output,
            fail_on_unstable,
            dry_run,
        } => record::run(record::RecordArgs {
            workspace: &workspace,
            store: &store,
            job,
            build,
            status,
            issue_files: issues,
            config: config.as_deref(),
            reference_job,
            reference_build,
            require_passed_gate,
            require_success,
            analysis_id: id,
            format: &format,
            output: output.as_deref(),
            fail_on_unstable,
            dry_run,
        }),

        Commands::History { job, format } => history::run(&store, job.as_deref(), &format),

        Commands::Reset { job, build, id } => reset::run(&store, &job, build, &id),

        Commands::Version => {
            println!("warngate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
