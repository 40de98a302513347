//! Delta classification against a reference build
//!
//! Current issues are matched to reference issues by fingerprint. A
//! fingerprint occurring k times in the reference matches at most k current
//! issues. Unmatched current issues are new, unmatched reference issues are
//! fixed, everything matched is outstanding.

mod statistics;

pub use statistics::{DeltaCounts, IssuesStatistics};

use crate::history::RunId;
use crate::models::Report;
use std::collections::{HashMap, VecDeque};
use tracing::info;

/// Current issues partitioned relative to a reference build.
#[derive(Debug, Clone, Default)]
pub struct DeltaReport {
    pub reference: Option<RunId>,
    /// Every current issue, with its `reference` build filled in
    pub all: Report,
    pub new_issues: Report,
    pub fixed_issues: Report,
    pub outstanding_issues: Report,
    pub statistics: IssuesStatistics,
}

impl DeltaReport {
    /// Classify `current` (issues of build `build`) against an optional reference.
    pub fn classify(current: Report, reference: Option<(&RunId, &Report)>, build: u64) -> Self {
        match reference {
            Some((run, issues)) => Self::with_reference(current, run, issues, build),
            None => Self::without_reference(current, build),
        }
    }

    /// No reference: every issue is outstanding.
    pub fn without_reference(mut current: Report, build: u64) -> Self {
        current.log_info("No valid reference build found");
        current.log_info("All reported issues will be considered outstanding");
        info!("No reference build, {} issues outstanding", current.size());

        for issue in current.issues.iter_mut() {
            issue.reference.get_or_insert(build);
        }

        let outstanding = Report::from_issues(current.issues.clone());
        let statistics = IssuesStatistics::new(
            current.counts(),
            Default::default(),
            Default::default(),
            outstanding.counts(),
        );
        Self {
            reference: None,
            new_issues: Report::new(),
            fixed_issues: Report::new(),
            outstanding_issues: outstanding,
            all: current,
            statistics,
        }
    }

    pub fn with_reference(mut current: Report, run: &RunId, reference: &Report, build: u64) -> Self {
        current.log_info(format!(
            "Using reference build '{}' to compute new, fixed, and outstanding issues",
            run
        ));

        // Reference positions per fingerprint, in report order
        let mut remaining: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for (index, issue) in reference.issues.iter().enumerate() {
            if issue.has_fingerprint() {
                remaining
                    .entry(issue.fingerprint.as_str())
                    .or_default()
                    .push_back(index);
            }
        }
        let mut consumed = vec![false; reference.size()];

        let mut new_issues = Report::new();
        let mut outstanding_issues = Report::new();
        for issue in current.issues.iter_mut() {
            let matched = if issue.has_fingerprint() {
                remaining
                    .get_mut(issue.fingerprint.as_str())
                    .and_then(VecDeque::pop_front)
            } else {
                None
            };
            match matched {
                Some(index) => {
                    consumed[index] = true;
                    issue.reference = Some(reference.issues[index].reference.unwrap_or(run.number));
                    outstanding_issues.add(issue.clone());
                }
                None => {
                    issue.reference = Some(build);
                    new_issues.add(issue.clone());
                }
            }
        }

        let mut fixed_issues = Report::new();
        fixed_issues.add_all(
            reference
                .issues
                .iter()
                .zip(&consumed)
                .filter(|(_, used)| !**used)
                .map(|(issue, _)| issue.clone()),
        );

        let statistics = IssuesStatistics::new(
            current.counts(),
            new_issues.counts(),
            fixed_issues.counts(),
            outstanding_issues.counts(),
        );
        current.log_info(format!(
            "Issues delta (vs. reference build): outstanding: {}, new: {}, fixed: {}",
            outstanding_issues.size(),
            new_issues.size(),
            fixed_issues.size()
        ));
        info!(
            reference = %run,
            outstanding = outstanding_issues.size(),
            new = new_issues.size(),
            fixed = fixed_issues.size(),
            "Classified issues"
        );

        Self {
            reference: Some(run.clone()),
            all: current,
            new_issues,
            fixed_issues,
            outstanding_issues,
            statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Issue, Severity};

    fn issue(fingerprint: &str, severity: Severity) -> Issue {
        Issue {
            file_name: "src/main.c".into(),
            message: fingerprint.to_uppercase(),
            fingerprint: fingerprint.into(),
            severity,
            ..Default::default()
        }
    }

    fn report(fingerprints: &[&str]) -> Report {
        Report::from_issues(
            fingerprints
                .iter()
                .map(|f| issue(f, Severity::WarningNormal))
                .collect(),
        )
    }

    fn reference_run() -> RunId {
        RunId::new("app", 1)
    }

    #[test]
    fn test_without_reference_everything_outstanding() {
        let delta = DeltaReport::without_reference(report(&["a", "b", "b"]), 1);
        assert_eq!(delta.statistics.new.total, 0);
        assert_eq!(delta.statistics.fixed.total, 0);
        assert_eq!(delta.statistics.outstanding.total, 3);
        assert_eq!(delta.outstanding_issues.size(), 3);
        assert!(delta.all.iter().all(|i| i.reference == Some(1)));
        assert!(delta
            .all
            .info_messages
            .contains(&"All reported issues will be considered outstanding".to_string()));
    }

    #[test]
    fn test_new_fixed_outstanding() {
        let reference = report(&["x", "y"]);
        let current = report(&["x", "z"]);
        let delta = DeltaReport::with_reference(current, &reference_run(), &reference, 2);

        assert_eq!(delta.outstanding_issues.issues[0].fingerprint, "x");
        assert_eq!(delta.new_issues.issues[0].fingerprint, "z");
        assert_eq!(delta.fixed_issues.issues[0].fingerprint, "y");
        assert_eq!(delta.statistics.new.total, 1);
        assert_eq!(delta.statistics.fixed.total, 1);
        assert_eq!(delta.statistics.outstanding.total, 1);
        assert_eq!(delta.statistics.total.total, 2);
    }

    #[test]
    fn test_duplicates_match_at_most_once() {
        let reference = report(&["a", "a"]);
        let current = report(&["a", "a", "a"]);
        let delta = DeltaReport::with_reference(current, &reference_run(), &reference, 2);
        assert_eq!(delta.statistics.outstanding.total, 2);
        assert_eq!(delta.statistics.new.total, 1);
        assert_eq!(delta.statistics.fixed.total, 0);

        let reference = report(&["a", "a", "a"]);
        let delta = DeltaReport::with_reference(report(&["a"]), &reference_run(), &reference, 2);
        assert_eq!(delta.statistics.fixed.total, 2);
    }

    #[test]
    fn test_partition_identities() {
        let reference = report(&["a", "b", "c", "c", "", "d"]);
        let current = report(&["c", "a", "e", "", "c", "c"]);
        let (current_size, reference_size) = (current.size(), reference.size());
        let delta = DeltaReport::with_reference(current, &reference_run(), &reference, 2);
        let s = &delta.statistics;
        assert_eq!(s.new.total + s.outstanding.total, current_size);
        assert_eq!(s.fixed.total + s.outstanding.total, reference_size);
    }

    #[test]
    fn test_empty_fingerprints_never_match() {
        let reference = report(&[""]);
        let current = report(&[""]);
        let delta = DeltaReport::with_reference(current, &reference_run(), &reference, 2);
        assert_eq!(delta.statistics.new.total, 1);
        assert_eq!(delta.statistics.fixed.total, 1);
        assert_eq!(delta.statistics.outstanding.total, 0);
    }

    #[test]
    fn test_empty_current_fixes_everything() {
        let reference = report(&["a", "b", "c"]);
        let delta = DeltaReport::with_reference(Report::new(), &reference_run(), &reference, 2);
        assert_eq!(delta.statistics.fixed.total, 3);
        assert_eq!(delta.statistics.new.total, 0);
        assert_eq!(delta.statistics.total.total, 0);
        assert_eq!(delta.statistics.delta.total, -3);
    }

    #[test]
    fn test_reference_build_is_carried_over() {
        let mut reference = report(&["old", "recent"]);
        reference.issues[0].reference = Some(1);
        reference.issues[1].reference = None;
        let current = report(&["old", "recent", "fresh"]);
        let run = RunId::new("app", 4);
        let delta = DeltaReport::with_reference(current, &run, &reference, 5);

        let refs: Vec<Option<u64>> = delta.all.iter().map(|i| i.reference).collect();
        assert_eq!(refs, vec![Some(1), Some(4), Some(5)]);
    }

    #[test]
    fn test_fixed_keeps_reference_records_in_order() {
        let mut reference = report(&["b", "a", "c"]);
        reference.issues[0].severity = Severity::Error;
        let delta = DeltaReport::with_reference(report(&["a"]), &reference_run(), &reference, 2);
        let fixed: Vec<&str> = delta.fixed_issues.iter().map(|i| i.fingerprint.as_str()).collect();
        assert_eq!(fixed, vec!["b", "c"]);
        assert_eq!(delta.statistics.fixed.error, 1);
        assert_eq!(delta.statistics.delta.error, -1);
    }

    #[test]
    fn test_per_severity_counts() {
        let reference = Report::from_issues(vec![issue("gone", Severity::WarningHigh)]);
        let current = Report::from_issues(vec![
            issue("n1", Severity::Error),
            issue("n2", Severity::WarningLow),
        ]);
        let delta = DeltaReport::classify(current, Some((&reference_run(), &reference)), 2);
        assert_eq!(delta.statistics.new.error, 1);
        assert_eq!(delta.statistics.new.low, 1);
        assert_eq!(delta.statistics.fixed.high, 1);
        assert_eq!(delta.statistics.delta.high, -1);
        assert_eq!(delta.statistics.total.get(Severity::Error), 1);
    }
}
