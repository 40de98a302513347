//! `warngate history` command: list recorded runs

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::gates::QualityGateStatus;
use crate::history::{BuildHistory, BuildStatus, HistoryStore, RunId};

#[derive(Debug, Serialize)]
struct RunSummary {
    job: String,
    number: u64,
    timestamp: String,
    status: Option<BuildStatus>,
    quality_gate: QualityGateStatus,
    issues: Option<usize>,
    reference: Option<RunId>,
    reset_reference: Vec<String>,
}

fn summarize(history: &BuildHistory, job: Option<&str>) -> Vec<RunSummary> {
    let jobs: Vec<&str> = match job {
        Some(job) => vec![job],
        None => history.jobs().collect(),
    };
    jobs.into_iter()
        .flat_map(|job| {
            history.runs(job).iter().map(move |run| RunSummary {
                job: job.to_string(),
                number: run.number,
                timestamp: run.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                status: run.status,
                quality_gate: run.quality_gate,
                issues: run.issues.as_ref().map(|r| r.size()),
                reference: run.reference.clone(),
                reset_reference: run.reset_reference.iter().cloned().collect(),
            })
        })
        .collect()
}

fn render_text(runs: &[RunSummary]) -> String {
    if runs.is_empty() {
        return format!("{}\n", style("No runs recorded").dim());
    }
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        style(format!(
            "{:<20} {:>6}  {:<19}  {:<9} {:<8} {:>6}  {}",
            "JOB", "BUILD", "TIME", "STATUS", "GATE", "ISSUES", "REFERENCE"
        ))
        .bold()
    ));
    for run in runs {
        let status = run
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "BUILDING".to_string());
        let issues = run
            .issues
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reference = run
            .reference
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<20} {:>6}  {:<19}  {:<9} {:<8} {:>6}  {}",
            run.job, run.number, run.timestamp, status, run.quality_gate, issues, reference
        ));
        if !run.reset_reference.is_empty() {
            out.push_str(&format!(
                "  {}",
                style(format!("reset: {}", run.reset_reference.join(", "))).yellow()
            ));
        }
        out.push('\n');
    }
    out
}

pub(super) fn run(store: &HistoryStore, job: Option<&str>, format: &str) -> Result<()> {
    let history = store.load()?;
    let runs = summarize(&history, job);
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&runs)?);
    } else {
        print!("{}", render_text(&runs));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RunRecord;
    use crate::models::Report;

    fn sample() -> BuildHistory {
        let mut history = BuildHistory::new();
        history.add_run(
            "app",
            RunRecord::new(1, Some(BuildStatus::Success))
                .with_issues(Report::new(), QualityGateStatus::Passed),
        );
        history.add_run("app", RunRecord::new(2, None));
        history.add_run("lib", RunRecord::new(1, Some(BuildStatus::Failure)));
        history.reset_reference(&RunId::new("lib", 1), "gcc");
        history
    }

    #[test]
    fn test_summarize_filters_job() {
        let history = sample();
        assert_eq!(summarize(&history, None).len(), 3);
        let app = summarize(&history, Some("app"));
        assert_eq!(app.len(), 2);
        assert_eq!(app[0].issues, Some(0));
        assert_eq!(app[1].issues, None);
        assert!(summarize(&history, Some("missing")).is_empty());
    }

    #[test]
    fn test_render_text() {
        console::set_colors_enabled(false);
        let text = render_text(&summarize(&sample(), None));
        assert!(text.contains("BUILDING"));
        assert!(text.contains("PASSED"));
        assert!(text.contains("reset: gcc"));
        assert!(render_text(&[]).contains("No runs recorded"));
    }
}
