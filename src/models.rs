//! Core data models for Warngate
//!
//! Issues are produced by external report parsers and arrive already
//! normalized. Everything downstream (fingerprinting, delta classification,
//! quality gates, health) works on these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Severity of a reported issue.
///
/// Variants are declared lowest first so the derived `Ord` puts `Error` on top.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[serde(alias = "low", alias = "LOW")]
    WarningLow,
    #[default]
    #[serde(alias = "normal", alias = "NORMAL")]
    WarningNormal,
    #[serde(alias = "high", alias = "HIGH")]
    WarningHigh,
    #[serde(alias = "error")]
    Error,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::WarningHigh,
        Severity::WarningNormal,
        Severity::WarningLow,
    ];

    /// Every severity at or above `min`, most severe first.
    pub fn at_least(min: Severity) -> Vec<Severity> {
        Self::ALL.iter().copied().filter(|s| *s >= min).collect()
    }

    /// Short lowercase name used in gate labels and the text reporter.
    pub fn short_name(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::WarningHigh => "high",
            Severity::WarningNormal => "normal",
            Severity::WarningLow => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::WarningHigh => write!(f, "WARNING_HIGH"),
            Severity::WarningNormal => write!(f, "WARNING_NORMAL"),
            Severity::WarningLow => write!(f, "WARNING_LOW"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning_high" | "high" => Ok(Severity::WarningHigh),
            "warning_normal" | "normal" => Ok(Severity::WarningNormal),
            "warning_low" | "low" => Ok(Severity::WarningLow),
            _ => Err(format!(
                "unknown severity '{}' (expected error, high, normal or low)",
                s
            )),
        }
    }
}

/// One finding reported by a static-analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Issue {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub line_end: u32,
    #[serde(default)]
    pub column_start: u32,
    #[serde(default)]
    pub column_end: u32,
    #[serde(default)]
    pub message: String,
    /// Id of the tool that reported the issue
    #[serde(default)]
    pub origin: String,
    /// Identity across builds; empty until fingerprinted and never matches while empty
    #[serde(default)]
    pub fingerprint: String,
    /// Build in which the issue was first reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<u64>,
}

impl Issue {
    pub fn has_fingerprint(&self) -> bool {
        !self.fingerprint.is_empty()
    }
}

/// Issue counts broken out by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub total: usize,
    pub error: usize,
    pub high: usize,
    pub normal: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.add(issue.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::WarningHigh => self.high += 1,
            Severity::WarningNormal => self.normal += 1,
            Severity::WarningLow => self.low += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::WarningHigh => self.high,
            Severity::WarningNormal => self.normal,
            Severity::WarningLow => self.low,
        }
    }

    pub fn merge(&mut self, other: &SeverityCounts) {
        self.total += other.total;
        self.error += other.error;
        self.high += other.high;
        self.normal += other.normal;
        self.low += other.low;
    }
}

/// The ordered issues of one build, plus the messages explaining how they were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Issue count per contributing tool when several tools are aggregated
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub size_per_origin: BTreeMap<String, usize>,
    #[serde(default)]
    pub info_messages: Vec<String>,
    #[serde(default)]
    pub error_messages: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            ..Self::default()
        }
    }

    /// Aggregate the reports of several tools into one set, keeping the order of the inputs.
    pub fn aggregate(reports: impl IntoIterator<Item = Report>) -> Self {
        let mut aggregated = Report::new();
        for report in reports {
            for issue in &report.issues {
                if !issue.origin.is_empty() {
                    *aggregated
                        .size_per_origin
                        .entry(issue.origin.clone())
                        .or_insert(0) += 1;
                }
            }
            aggregated.issues.extend(report.issues);
            aggregated.info_messages.extend(report.info_messages);
            aggregated.error_messages.extend(report.error_messages);
        }
        aggregated
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn add_all(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn size(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn size_of(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Number of issues at or above `min`.
    pub fn count_at_least(&self, min: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity >= min).count()
    }

    /// Copy of this report holding only the issues at or above `min`.
    pub fn filter_min_severity(&self, min: Severity) -> Report {
        let mut filtered = self.copy_empty_instance();
        filtered.add_all(self.issues.iter().filter(|i| i.severity >= min).cloned());
        filtered
    }

    /// Empty report carrying over origins and message logs.
    pub fn copy_empty_instance(&self) -> Report {
        Report {
            issues: Vec::new(),
            size_per_origin: self.size_per_origin.clone(),
            info_messages: self.info_messages.clone(),
            error_messages: self.error_messages.clone(),
        }
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::from_issues(&self.issues)
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.info_messages.push(message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
