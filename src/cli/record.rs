//! `warngate record` command: evaluate one build and store it

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{load_config_file, load_project_config};
use crate::gates::QualityGateStatus;
use crate::history::{BuildStatus, HistoryStore, RunId};
use crate::models::{Issue, Report};
use crate::pipeline::{record_run, AnalysisPipeline};
use crate::reporters;

pub(super) struct RecordArgs<'a> {
    pub workspace: &'a Path,
    pub store: &'a HistoryStore,
    pub job: String,
    pub build: Option<u64>,
    pub status: BuildStatus,
    pub issue_files: Vec<PathBuf>,
    pub config: Option<&'a Path>,
    pub reference_job: Option<String>,
    pub reference_build: Option<u64>,
    pub require_passed_gate: bool,
    pub require_success: bool,
    pub analysis_id: Option<String>,
    pub format: &'a str,
    pub output: Option<&'a Path>,
    pub fail_on_unstable: bool,
    pub dry_run: bool,
}

/// Load one normalized issue file.
///
/// Accepts a bare array of issues or a report object. Issues without an
/// origin are attributed to the file stem.
pub(crate) fn load_issue_file(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read issue file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse issue file {}", path.display()))?;

    let mut report = if value.is_array() {
        let issues: Vec<Issue> = serde_json::from_value(value)
            .with_context(|| format!("Invalid issues in {}", path.display()))?;
        Report::from_issues(issues)
    } else {
        serde_json::from_value::<Report>(value)
            .with_context(|| format!("Invalid report in {}", path.display()))?
    };

    let origin = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("issues")
        .to_string();
    for issue in report.issues.iter_mut().filter(|i| i.origin.is_empty()) {
        issue.origin = origin.clone();
    }
    report.log_info(format!(
        "Loaded {} issues from {}",
        report.size(),
        path.display()
    ));
    debug!("Loaded {} issues from {}", report.size(), path.display());
    Ok(report)
}

pub(super) fn run(args: RecordArgs<'_>) -> Result<()> {
    let mut config = match args.config {
        Some(path) => load_config_file(path)?,
        None => load_project_config(args.workspace)?,
    };
    if let Some(job) = args.reference_job {
        config.reference.job = job;
    }
    if let Some(build) = args.reference_build {
        config.reference.build = Some(build);
    }
    if args.require_passed_gate {
        config.reference.ignore_quality_gate = false;
    }
    if args.require_success {
        config.reference.overall_result_must_be_success = true;
    }
    if let Some(id) = args.analysis_id {
        config.reference.analysis_id = id;
    }
    let options = config.analysis_options()?;

    let reports = args
        .issue_files
        .iter()
        .map(|path| load_issue_file(path))
        .collect::<Result<Vec<_>>>()?;
    if reports.is_empty() {
        warn!("No issue files given, evaluating an empty issue set");
    }
    let issues = Report::aggregate(reports);

    let mut history = args.store.load()?;
    let number = args
        .build
        .unwrap_or_else(|| history.next_number(&args.job));
    let run = RunId::new(args.job.as_str(), number);

    let pipeline = AnalysisPipeline::new(args.workspace, options);
    let result = pipeline.run(&history, &run, args.status, issues);

    let rendered = reporters::report(&result, args.format)?;
    match args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if args.dry_run {
        debug!("Dry run, not recording {}", run);
    } else {
        record_run(&mut history, &result);
        args.store.save(&history)?;
    }

    let status = result.quality_gate_status();
    let should_fail = status == QualityGateStatus::Failed
        || (args.fail_on_unstable && status == QualityGateStatus::Warning);
    if should_fail {
        eprintln!("Quality gate result is {}", status);
        std::process::exit(1);
    }
    Ok(())
}
