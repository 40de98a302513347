//! End-to-end checks of the analysis library across several builds

use warngate::delta::DeltaReport;
use warngate::gates::{Criticality, Metric, QualityGateEvaluator, QualityGateStatus};
use warngate::history::{BuildHistory, BuildStatus, ReferenceConfig, RunId};
use warngate::models::{Issue, Report, Severity};
use warngate::pipeline::{record_run, AnalysisOptions, AnalysisPipeline};
use warngate::scoring::{HealthDescriptor, HealthIcon};

fn source() -> String {
    (1..=15)
        .map(|n| format!("    step_{}(state, {});\n", n, n * 7))
        .collect()
}

fn issue(line: u32, issue_type: &str) -> Issue {
    Issue {
        file_name: "src/state.c".into(),
        category: "c".into(),
        issue_type: issue_type.into(),
        severity: Severity::WarningNormal,
        line_start: line,
        line_end: line,
        message: format!("{} here", issue_type),
        origin: "cppcheck".into(),
        ..Default::default()
    }
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/state.c"), source()).unwrap();
    dir
}

#[test]
fn test_new_fixed_and_outstanding_across_builds() {
    let dir = workspace();
    let pipeline = AnalysisPipeline::new(dir.path(), AnalysisOptions::default());
    let mut history = BuildHistory::new();

    let first = pipeline.run(
        &history,
        &RunId::new("app", 1),
        BuildStatus::Success,
        Report::from_issues(vec![issue(5, "X"), issue(10, "Y")]),
    );
    assert_eq!(first.statistics.outstanding.total, 2);
    record_run(&mut history, &first);

    let second = pipeline.run(
        &history,
        &RunId::new("app", 2),
        BuildStatus::Success,
        Report::from_issues(vec![issue(5, "X"), issue(10, "Z")]),
    );
    assert_eq!(second.reference, Some(RunId::new("app", 1)));
    assert_eq!(second.statistics.new.total, 1);
    assert_eq!(second.statistics.fixed.total, 1);
    assert_eq!(second.statistics.outstanding.total, 1);
    assert_eq!(second.new_issues[0].issue_type, "Z");
    assert_eq!(second.fixed_issues[0].issue_type, "Y");
    assert_eq!(second.outstanding_issues[0].issue_type, "X");
    assert_eq!(second.statistics.delta.total, 0);
}

#[test]
fn test_reference_job_without_builds() {
    let dir = workspace();
    let options = AnalysisOptions {
        reference: ReferenceConfig {
            job: "main".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut history = BuildHistory::new();
    let pipeline = AnalysisPipeline::new(dir.path(), AnalysisOptions::default());
    let earlier = pipeline.run(
        &history,
        &RunId::new("feature", 1),
        BuildStatus::Success,
        Report::from_issues(vec![issue(5, "X")]),
    );
    record_run(&mut history, &earlier);

    let result = AnalysisPipeline::new(dir.path(), options).run(
        &history,
        &RunId::new("feature", 2),
        BuildStatus::Success,
        Report::from_issues(vec![issue(5, "X"), issue(10, "Y")]),
    );
    assert_eq!(result.reference, None);
    assert_eq!(result.statistics.new.total, 0);
    assert_eq!(result.statistics.fixed.total, 0);
    assert_eq!(result.statistics.outstanding.total, 2);
    assert!(result
        .info_messages
        .iter()
        .any(|m| m.contains("Reference job 'main' has no completed builds")));
}

#[test]
fn test_worst_gate_wins() {
    let issues = Report::from_issues((1..=10).map(|n| issue(n, "X")).collect());
    let delta = DeltaReport::classify(issues, None, 1);
    assert_eq!(delta.statistics.total.total, 10);

    let mut gates = QualityGateEvaluator::new();
    gates.add_quality_gate(Metric::Total, 5, Criticality::Unstable);
    gates.add_quality_gate(Metric::Total, 10, Criticality::Failure);
    let result = gates.evaluate(&delta.statistics);
    assert_eq!(result.status, QualityGateStatus::Failed);
    assert_eq!(result.evaluations.len(), 2);
}

#[test]
fn test_health_bands() {
    let health = HealthDescriptor::new(0, 10, Severity::WarningLow)
        .compute_for_count(8)
        .unwrap();
    assert_eq!(health.score, 20);
    assert_eq!(health.icon, HealthIcon::From20To39);

    let disabled = HealthDescriptor::new(5, 5, Severity::WarningLow);
    assert!(disabled.compute_for_count(0).is_none());
    assert!(disabled.compute_for_count(50).is_none());
}
