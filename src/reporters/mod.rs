//! Output reporters for Warngate analysis results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::pipeline::AnalysisResult;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render an analysis result in the specified format
pub fn report(result: &AnalysisResult, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(result, fmt)
}

/// Render an analysis result using an OutputFormat enum
pub fn report_with_format(result: &AnalysisResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(result),
        OutputFormat::Json => json::render(result),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gates::{Criticality, Metric};
    use crate::history::{BuildHistory, BuildStatus, RunId};
    use crate::models::{Issue, Report, Severity};
    use crate::pipeline::{AnalysisOptions, AnalysisPipeline};
    use crate::scoring::HealthDescriptor;

    /// Evaluate a small first build with one gate and a health report
    pub(crate) fn test_result() -> AnalysisResult {
        let dir = tempfile::tempdir().unwrap();
        let mut options = AnalysisOptions::default();
        options.gates.add_quality_gate(Metric::Total, 2, Criticality::Unstable);
        options.health = HealthDescriptor::new(0, 4, Severity::WarningLow);

        let issues = Report::from_issues(vec![
            Issue {
                file_name: "src/net.c".into(),
                issue_type: "NullDeref".into(),
                severity: Severity::Error,
                line_start: 10,
                message: "possible null dereference".into(),
                origin: "cppcheck".into(),
                ..Default::default()
            },
            Issue {
                file_name: "src/util.c".into(),
                issue_type: "UnusedVar".into(),
                severity: Severity::WarningLow,
                line_start: 3,
                message: "unused variable 'tmp'".into(),
                origin: "gcc".into(),
                ..Default::default()
            },
        ]);
        AnalysisPipeline::new(dir.path(), options).run(
            &BuildHistory::new(),
            &RunId::new("app", 1),
            BuildStatus::Success,
            Report::aggregate([issues]),
        )
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_report_dispatch() {
        let result = test_result();
        assert!(report(&result, "json").unwrap().trim_start().starts_with('{'));
        assert!(report(&result, "text").unwrap().contains("Quality gate"));
        assert!(report(&result, "xml").is_err());
    }
}
