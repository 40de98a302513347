//! Quality gates
//!
//! A gate compares one metric of the delta statistics against a threshold.
//! Reaching the threshold marks the build unstable or failed, depending on
//! the gate's criticality.

mod evaluator;
mod legacy;

pub use evaluator::{GateEvaluation, QualityGateEvaluator, QualityGateResult};
pub use legacy::{expand_legacy_thresholds, legacy_gate, UnknownThreshold};

use crate::delta::IssuesStatistics;
use crate::history::BuildStatus;
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Result of evaluating a set of gates. Ordered so that the worse status is greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityGateStatus {
    #[default]
    Inactive,
    Passed,
    Warning,
    Failed,
}

impl QualityGateStatus {
    pub fn worse(self, other: QualityGateStatus) -> QualityGateStatus {
        self.max(other)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, QualityGateStatus::Inactive | QualityGateStatus::Passed)
    }

    /// Build result implied by this status.
    pub fn build_status(&self) -> BuildStatus {
        match self {
            QualityGateStatus::Inactive | QualityGateStatus::Passed => BuildStatus::Success,
            QualityGateStatus::Warning => BuildStatus::Unstable,
            QualityGateStatus::Failed => BuildStatus::Failure,
        }
    }
}

impl std::fmt::Display for QualityGateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityGateStatus::Inactive => write!(f, "INACTIVE"),
            QualityGateStatus::Passed => write!(f, "PASSED"),
            QualityGateStatus::Warning => write!(f, "WARNING"),
            QualityGateStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// What a reached gate does to the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criticality {
    #[serde(alias = "unstable")]
    Unstable,
    #[serde(alias = "failure", alias = "FAILED", alias = "failed")]
    Failure,
}

impl Criticality {
    /// Status of a gate with this criticality once its threshold is reached.
    pub fn status(&self) -> QualityGateStatus {
        match self {
            Criticality::Unstable => QualityGateStatus::Warning,
            Criticality::Failure => QualityGateStatus::Failed,
        }
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unstable" => Ok(Criticality::Unstable),
            "failure" | "failed" => Ok(Criticality::Failure),
            _ => Err(format!("unknown criticality '{}' (expected unstable or failure)", s)),
        }
    }
}

/// Which count of the statistics a gate reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Total,
    New,
    Delta,
}

/// Metric a gate is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    Total,
    TotalError,
    TotalHigh,
    TotalNormal,
    TotalLow,
    New,
    NewError,
    NewHigh,
    NewNormal,
    NewLow,
    Delta,
    DeltaError,
    DeltaHigh,
    DeltaNormal,
    DeltaLow,
}

impl Metric {
    pub const ALL: [Metric; 15] = [
        Metric::Total,
        Metric::TotalError,
        Metric::TotalHigh,
        Metric::TotalNormal,
        Metric::TotalLow,
        Metric::New,
        Metric::NewError,
        Metric::NewHigh,
        Metric::NewNormal,
        Metric::NewLow,
        Metric::Delta,
        Metric::DeltaError,
        Metric::DeltaHigh,
        Metric::DeltaNormal,
        Metric::DeltaLow,
    ];

    fn parts(&self) -> (Scope, Option<Severity>) {
        use Metric::*;
        match self {
            Total => (Scope::Total, None),
            TotalError => (Scope::Total, Some(Severity::Error)),
            TotalHigh => (Scope::Total, Some(Severity::WarningHigh)),
            TotalNormal => (Scope::Total, Some(Severity::WarningNormal)),
            TotalLow => (Scope::Total, Some(Severity::WarningLow)),
            New => (Scope::New, None),
            NewError => (Scope::New, Some(Severity::Error)),
            NewHigh => (Scope::New, Some(Severity::WarningHigh)),
            NewNormal => (Scope::New, Some(Severity::WarningNormal)),
            NewLow => (Scope::New, Some(Severity::WarningLow)),
            Delta => (Scope::Delta, None),
            DeltaError => (Scope::Delta, Some(Severity::Error)),
            DeltaHigh => (Scope::Delta, Some(Severity::WarningHigh)),
            DeltaNormal => (Scope::Delta, Some(Severity::WarningNormal)),
            DeltaLow => (Scope::Delta, Some(Severity::WarningLow)),
        }
    }

    fn from_parts(scope: Scope, severity: Option<Severity>) -> Metric {
        Self::ALL
            .into_iter()
            .find(|m| m.parts() == (scope, severity))
            .unwrap_or(Metric::Total)
    }

    /// Severity the metric is restricted to, if any.
    pub fn severity(&self) -> Option<Severity> {
        self.parts().1
    }

    /// Read this metric from the statistics. Delta metrics can be negative.
    pub fn value(&self, stats: &IssuesStatistics) -> i64 {
        let (scope, severity) = self.parts();
        match (scope, severity) {
            (Scope::Total, None) => stats.total.total as i64,
            (Scope::Total, Some(s)) => stats.total.get(s) as i64,
            (Scope::New, None) => stats.new.total as i64,
            (Scope::New, Some(s)) => stats.new.get(s) as i64,
            (Scope::Delta, None) => stats.delta.total,
            (Scope::Delta, Some(s)) => stats.delta.get(s),
        }
    }

    /// Human readable label used in the evaluation trace.
    pub fn label(&self) -> String {
        let (scope, severity) = self.parts();
        let name = match scope {
            Scope::Total => "Total number of issues",
            Scope::New => "Number of new issues",
            Scope::Delta => "Delta (current build - reference build)",
        };
        match severity {
            None => format!("{} (any severity)", name),
            Some(s) => format!("{} (severity {})", name, s.short_name()),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (scope, severity) = self.parts();
        let scope = match scope {
            Scope::Total => "TOTAL",
            Scope::New => "NEW",
            Scope::Delta => "DELTA",
        };
        match severity {
            None => write!(f, "{}", scope),
            Some(s) => write!(f, "{}_{}", scope, s.short_name().to_uppercase()),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.to_string() == normalized)
            .ok_or_else(|| format!("unknown quality gate metric '{}'", s))
    }
}

/// One threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityGate {
    pub metric: Metric,
    pub threshold: u32,
    pub criticality: Criticality,
}

impl QualityGate {
    pub fn new(metric: Metric, threshold: u32, criticality: Criticality) -> Self {
        Self {
            metric,
            threshold,
            criticality,
        }
    }
}
