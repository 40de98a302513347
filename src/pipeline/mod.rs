//! Build evaluation pipeline
//!
//! Orchestrates one evaluation of a build:
//! 1. Fingerprint the current issues
//! 2. Resolve the reference build from history
//! 3. Classify issues as new, fixed or outstanding
//! 4. Evaluate quality gates
//! 5. Compute the health report
//!
//! The history is only read while evaluating; [`record_run`] appends the
//! finished run afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::delta::{DeltaReport, IssuesStatistics};
use crate::fingerprint::{FingerprintStats, Fingerprinter, DEFAULT_CONTEXT_LINES};
use crate::gates::{QualityGateEvaluator, QualityGateResult, QualityGateStatus};
use crate::history::{
    BuildHistory, BuildStatus, ReferenceConfig, ReferenceResolver, RunHistory, RunId, RunRecord,
};
use crate::models::{Issue, Report};
use crate::scoring::{HealthDescriptor, HealthReport};

/// Validated settings for one evaluation.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub reference: ReferenceConfig,
    pub gates: QualityGateEvaluator,
    pub health: HealthDescriptor,
    pub context_lines: usize,
    /// Budget for reading source files while fingerprinting
    pub timeout: Option<Duration>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            reference: ReferenceConfig::default(),
            gates: QualityGateEvaluator::new(),
            health: HealthDescriptor::default(),
            context_lines: DEFAULT_CONTEXT_LINES,
            timeout: None,
        }
    }
}

/// Everything one evaluation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run: RunId,
    pub reference: Option<RunId>,
    /// Build result after applying the quality gate
    pub build_status: BuildStatus,
    pub statistics: IssuesStatistics,
    pub quality_gate: QualityGateResult,
    pub health: Option<HealthReport>,
    pub fingerprints: FingerprintStats,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub size_per_origin: BTreeMap<String, usize>,
    pub info_messages: Vec<String>,
    pub error_messages: Vec<String>,
    pub new_issues: Vec<Issue>,
    pub fixed_issues: Vec<Issue>,
    pub outstanding_issues: Vec<Issue>,
    /// All current issues as stored in the history
    #[serde(skip)]
    pub issues: Report,
}

impl AnalysisResult {
    pub fn quality_gate_status(&self) -> QualityGateStatus {
        self.quality_gate.status
    }
}

/// Evaluates builds of a workspace.
pub struct AnalysisPipeline {
    workspace: PathBuf,
    options: AnalysisOptions,
}

impl AnalysisPipeline {
    pub fn new(workspace: impl Into<PathBuf>, options: AnalysisOptions) -> Self {
        Self {
            workspace: workspace.into(),
            options,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Evaluate `issues` reported by build `run`, whose own result is `build_status`.
    pub fn run(
        &self,
        history: &dyn RunHistory,
        run: &RunId,
        build_status: BuildStatus,
        mut issues: Report,
    ) -> AnalysisResult {
        info!("Analyzing {} with {} issues", run, issues.size());

        let mut fingerprinter = Fingerprinter::new(&self.workspace)
            .with_context_lines(self.options.context_lines);
        if let Some(timeout) = self.options.timeout {
            fingerprinter = fingerprinter.with_timeout(timeout);
        }
        let fingerprints = fingerprinter.fingerprint_report(&mut issues);

        let resolution = ReferenceResolver::new(history, &self.options.reference).resolve(run);
        for message in resolution.messages {
            issues.log_info(message);
        }
        let reference = resolution
            .reference
            .as_ref()
            .and_then(|r| history.attached_issue_set(r).map(|report| (r, report)));
        let delta = DeltaReport::classify(issues, reference, run.number);

        let quality_gate = self.options.gates.evaluate(&delta.statistics);
        let mut all = delta.all;
        for line in &quality_gate.trace {
            all.log_info(line.clone());
        }
        if !quality_gate.status.is_successful() {
            warn!("Quality gate {} for {}", quality_gate.status, run);
        }

        let health = self.options.health.compute(&all);
        let final_status = build_status.worse(quality_gate.status.build_status());
        info!(
            "{}: {} issues ({} new, {} fixed), quality gate {}, result {}",
            run,
            delta.statistics.total.total,
            delta.statistics.new.total,
            delta.statistics.fixed.total,
            quality_gate.status,
            final_status
        );

        AnalysisResult {
            run: run.clone(),
            reference: delta.reference,
            build_status: final_status,
            statistics: delta.statistics,
            health,
            fingerprints,
            size_per_origin: all.size_per_origin.clone(),
            info_messages: all.info_messages.clone(),
            error_messages: all.error_messages.clone(),
            new_issues: delta.new_issues.issues,
            fixed_issues: delta.fixed_issues.issues,
            outstanding_issues: delta.outstanding_issues.issues,
            quality_gate,
            issues: all,
        }
    }
}

/// Store the evaluated run in `history` so later builds can use it as reference.
pub fn record_run(history: &mut BuildHistory, result: &AnalysisResult) -> RunId {
    let mut record = RunRecord::new(result.run.number, Some(result.build_status))
        .with_issues(result.issues.clone(), result.quality_gate.status);
    record.reference = result.reference.clone();
    history.add_run(&result.run.job, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{Criticality, Metric};
    use crate::models::Severity;

    const SOURCE: &str = "\
fn main() {
    let a = 1;
    let b = 2;
    let c = 3;
    let d = 4;
    let e = 5;
    let f = 6;
    let g = 7;
    let h = 8;
    println!(\"{}\", a + b + c + d + e + f + g + h);
}
";

    fn issue(file: &str, line: u32, issue_type: &str) -> Issue {
        Issue {
            file_name: file.into(),
            category: "rust".into(),
            issue_type: issue_type.into(),
            severity: Severity::WarningNormal,
            line_start: line,
            message: format!("{} at {}", issue_type, line),
            origin: "clippy".into(),
            ..Default::default()
        }
    }

    fn workspace(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), content).unwrap();
        dir
    }

    fn evaluate(
        pipeline: &AnalysisPipeline,
        history: &mut BuildHistory,
        number: u64,
        issues: Vec<Issue>,
    ) -> AnalysisResult {
        let run = RunId::new("app", number);
        let report = Report::aggregate([Report::from_issues(issues)]);
        let result = pipeline.run(history, &run, BuildStatus::Success, report);
        record_run(history, &result);
        result
    }

    #[test]
    fn test_first_build_all_outstanding() {
        let ws = workspace(SOURCE);
        let pipeline = AnalysisPipeline::new(ws.path(), AnalysisOptions::default());
        let mut history = BuildHistory::new();

        let result = evaluate(&pipeline, &mut history, 1, vec![issue("main.rs", 3, "unused")]);
        assert!(result.reference.is_none());
        assert_eq!(result.statistics.outstanding.total, 1);
        assert_eq!(result.statistics.new.total, 0);
        assert_eq!(result.quality_gate_status(), QualityGateStatus::Inactive);
        assert!(result.health.is_none());
        assert_eq!(result.size_per_origin.get("clippy"), Some(&1));
        assert_eq!(history.runs("app").len(), 1);
    }

    #[test]
    fn test_second_build_diffs_against_first() {
        let ws = workspace(SOURCE);
        let pipeline = AnalysisPipeline::new(ws.path(), AnalysisOptions::default());
        let mut history = BuildHistory::new();
        evaluate(
            &pipeline,
            &mut history,
            1,
            vec![issue("main.rs", 2, "unused"), issue("main.rs", 9, "unused")],
        );

        // Two lines inserted between the issues move the second one from 9 to 11
        let edited = SOURCE.replace("    let e = 5;\n", "    // x\n    // y\n    let e = 5;\n");
        std::fs::write(ws.path().join("main.rs"), edited).unwrap();
        let result = evaluate(
            &pipeline,
            &mut history,
            2,
            vec![
                issue("main.rs", 2, "unused"),
                issue("main.rs", 11, "unused"),
                issue("other.rs", 9, "shadow"),
            ],
        );

        assert_eq!(result.reference, Some(RunId::new("app", 1)));
        assert_eq!(result.statistics.outstanding.total, 2);
        assert_eq!(result.statistics.fixed.total, 0);
        assert_eq!(result.new_issues.len(), 1);
        assert_eq!(result.new_issues[0].file_name, "other.rs");
        assert_eq!(result.new_issues[0].reference, Some(2));
        assert!(result.outstanding_issues.iter().all(|i| i.reference == Some(1)));
    }

    #[test]
    fn test_fixed_issue_is_reported() {
        let ws = workspace(SOURCE);
        let pipeline = AnalysisPipeline::new(ws.path(), AnalysisOptions::default());
        let mut history = BuildHistory::new();
        evaluate(
            &pipeline,
            &mut history,
            1,
            vec![issue("main.rs", 2, "unused"), issue("main.rs", 9, "unused")],
        );

        let result = evaluate(&pipeline, &mut history, 2, vec![issue("main.rs", 2, "unused")]);
        assert_eq!(result.fixed_issues.len(), 1);
        assert_eq!(result.fixed_issues[0].line_start, 9);
        assert_eq!(result.statistics.delta.total, -1);
    }

    #[test]
    fn test_failed_gate_fails_build() {
        let ws = workspace(SOURCE);
        let mut options = AnalysisOptions::default();
        options.gates.add_quality_gate(Metric::Total, 1, Criticality::Failure);
        options.health = HealthDescriptor::new(0, 10, Severity::WarningLow);
        let pipeline = AnalysisPipeline::new(ws.path(), options);
        let mut history = BuildHistory::new();

        let result = evaluate(&pipeline, &mut history, 1, vec![issue("main.rs", 2, "unused")]);
        assert_eq!(result.quality_gate_status(), QualityGateStatus::Failed);
        assert_eq!(result.build_status, BuildStatus::Failure);
        assert_eq!(result.health.as_ref().map(|h| h.score), Some(90));
        assert!(result
            .info_messages
            .iter()
            .any(|m| m == "Some quality gates have been missed: overall result is FAILED"));

        let stored = history.record(&RunId::new("app", 1)).unwrap();
        assert_eq!(stored.quality_gate, QualityGateStatus::Failed);
        assert_eq!(stored.status, Some(BuildStatus::Failure));
    }

    #[test]
    fn test_missing_reference_job_degrades_to_first_build() {
        let ws = workspace(SOURCE);
        let options = AnalysisOptions {
            reference: ReferenceConfig {
                job: "nightly".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let pipeline = AnalysisPipeline::new(ws.path(), options);
        let mut history = BuildHistory::new();
        evaluate(&pipeline, &mut history, 1, vec![issue("main.rs", 2, "unused")]);

        let result = evaluate(&pipeline, &mut history, 2, vec![issue("main.rs", 2, "unused")]);
        assert!(result.reference.is_none());
        assert_eq!(result.statistics.outstanding.total, 1);
        assert!(result
            .info_messages
            .iter()
            .any(|m| m == "All reported issues will be considered outstanding"));
    }
}
