//! Text (terminal) reporter with colors and formatting

use crate::gates::QualityGateStatus;
use crate::models::{Issue, Severity, SeverityCounts};
use crate::pipeline::AnalysisResult;
use anyhow::Result;
use console::style;
use std::fmt::Write as _;

/// Issues listed per section before the rest is summarized
const MAX_LISTED: usize = 20;

fn status_label(status: QualityGateStatus) -> String {
    let label = status.to_string();
    match status {
        QualityGateStatus::Passed => style(label).green().bold().to_string(),
        QualityGateStatus::Warning => style(label).yellow().bold().to_string(),
        QualityGateStatus::Failed => style(label).red().bold().to_string(),
        QualityGateStatus::Inactive => style(label).dim().to_string(),
    }
}

fn severity_tag(severity: Severity) -> String {
    match severity {
        Severity::Error => style("[E]").red().to_string(),
        Severity::WarningHigh => style("[H]").red().bright().to_string(),
        Severity::WarningNormal => style("[N]").yellow().to_string(),
        Severity::WarningLow => style("[L]").blue().to_string(),
    }
}

fn breakdown(counts: &SeverityCounts) -> String {
    format!(
        "{} (error {}, high {}, normal {}, low {})",
        counts.total, counts.error, counts.high, counts.normal, counts.low
    )
}

fn list_issues(out: &mut String, title: &str, issues: &[Issue]) -> std::fmt::Result {
    if issues.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{} ({})", style(title).bold(), issues.len())?;
    for issue in issues.iter().take(MAX_LISTED) {
        writeln!(
            out,
            "  {} {}:{} {} {}",
            severity_tag(issue.severity),
            issue.file_name,
            issue.line_start,
            style(&issue.issue_type).dim(),
            issue.message
        )?;
    }
    if issues.len() > MAX_LISTED {
        writeln!(
            out,
            "  {}",
            style(format!("... and {} more", issues.len() - MAX_LISTED)).dim()
        )?;
    }
    Ok(())
}

/// Render result as formatted terminal output
pub fn render(result: &AnalysisResult) -> Result<String> {
    let mut out = String::new();
    let stats = &result.statistics;

    writeln!(out, "\n{}", style(format!("Warngate: {}", result.run)).bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    match &result.reference {
        Some(reference) => writeln!(out, "Reference build: {}", reference)?,
        None => writeln!(out, "Reference build: {}", style("none").dim())?,
    }
    writeln!(out, "Result: {}", result.build_status)?;

    writeln!(out, "\n{}", style("ISSUES").bold())?;
    writeln!(out, "  Total:       {}", breakdown(&stats.total))?;
    writeln!(out, "  New:         {}", breakdown(&stats.new))?;
    writeln!(out, "  Fixed:       {}", breakdown(&stats.fixed))?;
    writeln!(out, "  Outstanding: {}", breakdown(&stats.outstanding))?;
    writeln!(out, "  Delta:       {:+}", stats.delta.total)?;
    if !result.size_per_origin.is_empty() {
        let origins: Vec<String> = result
            .size_per_origin
            .iter()
            .map(|(origin, size)| format!("{} {}", origin, size))
            .collect();
        writeln!(out, "  Tools:       {}", origins.join(", "))?;
    }

    writeln!(
        out,
        "\n{} {}",
        style("Quality gate").bold(),
        status_label(result.quality_gate.status)
    )?;
    for line in &result.quality_gate.trace {
        writeln!(out, "  {}", line)?;
    }

    if let Some(health) = &result.health {
        writeln!(
            out,
            "\n{} {}% [{}] {}",
            style("Health").bold(),
            health.score,
            health.icon,
            health.description
        )?;
    }

    list_issues(&mut out, "NEW", &result.new_issues)?;
    list_issues(&mut out, "FIXED", &result.fixed_issues)?;

    if !result.error_messages.is_empty() {
        writeln!(out, "\n{}", style("ERRORS").red().bold())?;
        for message in &result.error_messages {
            writeln!(out, "  {}", message)?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    fn plain(result: &AnalysisResult) -> String {
        console::set_colors_enabled(false);
        render(result).expect("render text")
    }

    #[test]
    fn test_text_render_sections() {
        let text = plain(&test_result());
        assert!(text.contains("Warngate: app #1"));
        assert!(text.contains("Reference build: none"));
        assert!(text.contains("Result: UNSTABLE"));
        assert!(text.contains("Total:       2 (error 1, high 0, normal 0, low 1)"));
        assert!(text.contains("Quality gate WARNING"));
        assert!(text.contains("Health 50% [40to59] 2 warnings found"));
        assert!(text.contains("Tools:       cppcheck 1, gcc 1"));
    }

    #[test]
    fn test_text_lists_new_issues() {
        let mut result = test_result();
        result.new_issues = result.outstanding_issues.clone();
        let text = plain(&result);
        assert!(text.contains("NEW (2)"));
        assert!(text.contains("src/net.c:10"));
        assert!(!text.contains("FIXED"));
    }

    #[test]
    fn test_text_truncates_long_lists() {
        let mut result = test_result();
        let issue = result.outstanding_issues[0].clone();
        result.fixed_issues = vec![issue; MAX_LISTED + 5];
        let text = plain(&result);
        assert!(text.contains("... and 5 more"));
    }

    #[test]
    fn test_list_issues_writes_nothing_for_empty_section() {
        let mut out = String::new();
        list_issues(&mut out, "NEW", &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_text_shows_error_messages() {
        let mut result = test_result();
        result.error_messages = vec!["Can't read source code of 2 issues".to_string()];
        let text = plain(&result);
        assert!(text.contains("ERRORS"));
        assert!(text.contains("Can't read source code of 2 issues"));
    }
}
