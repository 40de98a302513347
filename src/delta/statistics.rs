//! Issue counts of one analysis, overall and per severity

use crate::models::{Severity, SeverityCounts};
use serde::{Deserialize, Serialize};

/// `new - fixed`, overall and per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaCounts {
    pub total: i64,
    pub error: i64,
    pub high: i64,
    pub normal: i64,
    pub low: i64,
}

impl DeltaCounts {
    fn between(new: &SeverityCounts, fixed: &SeverityCounts) -> Self {
        let diff = |a: usize, b: usize| a as i64 - b as i64;
        Self {
            total: diff(new.total, fixed.total),
            error: diff(new.error, fixed.error),
            high: diff(new.high, fixed.high),
            normal: diff(new.normal, fixed.normal),
            low: diff(new.low, fixed.low),
        }
    }

    pub fn get(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Error => self.error,
            Severity::WarningHigh => self.high,
            Severity::WarningNormal => self.normal,
            Severity::WarningLow => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesStatistics {
    /// All issues of the current build
    pub total: SeverityCounts,
    pub new: SeverityCounts,
    pub fixed: SeverityCounts,
    pub outstanding: SeverityCounts,
    pub delta: DeltaCounts,
}

impl IssuesStatistics {
    pub fn new(
        total: SeverityCounts,
        new: SeverityCounts,
        fixed: SeverityCounts,
        outstanding: SeverityCounts,
    ) -> Self {
        Self {
            total,
            new,
            fixed,
            outstanding,
            delta: DeltaCounts::between(&new, &fixed),
        }
    }

    /// Sum the statistics of several analyses.
    pub fn aggregate<'a>(all: impl IntoIterator<Item = &'a IssuesStatistics>) -> Self {
        let mut total = SeverityCounts::default();
        let mut new = SeverityCounts::default();
        let mut fixed = SeverityCounts::default();
        let mut outstanding = SeverityCounts::default();
        for stats in all {
            total.merge(&stats.total);
            new.merge(&stats.new);
            fixed.merge(&stats.fixed);
            outstanding.merge(&stats.outstanding);
        }
        Self::new(total, new, fixed, outstanding)
    }
}
