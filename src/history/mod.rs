//! Build history
//!
//! Runs of a job are addressed by [`RunId`] handles and walked backwards
//! through the [`RunHistory`] trait. [`BuildHistory`] is the in-memory
//! implementation that the CLI persists with [`store::HistoryStore`].

pub mod reference;
pub mod store;

use crate::gates::QualityGateStatus;
use crate::models::Report;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

pub use reference::{ReferenceConfig, ReferenceResolution, ReferenceResolver};
pub use store::{HistoryError, HistoryStore};

/// Handle of one run: the job it belongs to and its build number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId {
    pub job: String,
    pub number: u64,
}

impl RunId {
    pub fn new(job: impl Into<String>, number: u64) -> Self {
        Self {
            job: job.into(),
            number,
        }
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.job, self.number)
    }
}

/// Overall result of a build, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Unstable,
    Failure,
    Aborted,
}

impl BuildStatus {
    pub fn worse(self, other: BuildStatus) -> BuildStatus {
        self.max(other)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "SUCCESS"),
            BuildStatus::Unstable => write!(f, "UNSTABLE"),
            BuildStatus::Failure => write!(f, "FAILURE"),
            BuildStatus::Aborted => write!(f, "ABORTED"),
        }
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(BuildStatus::Success),
            "unstable" => Ok(BuildStatus::Unstable),
            "failure" | "failed" => Ok(BuildStatus::Failure),
            "aborted" => Ok(BuildStatus::Aborted),
            _ => Err(format!(
                "unknown build status '{}' (expected success, unstable, failure or aborted)",
                s
            )),
        }
    }
}

/// Everything stored about one run of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub number: u64,
    /// `None` while the build is still running
    #[serde(default)]
    pub status: Option<BuildStatus>,
    pub timestamp: DateTime<Utc>,
    /// Issues attached once the run has been analyzed
    #[serde(default)]
    pub issues: Option<Report>,
    #[serde(default)]
    pub quality_gate: QualityGateStatus,
    /// Run the issues were compared against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<RunId>,
    /// Analysis ids whose quality gate is ignored when this run is considered as reference
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub reset_reference: BTreeSet<String>,
}

impl RunRecord {
    pub fn new(number: u64, status: Option<BuildStatus>) -> Self {
        Self {
            number,
            status,
            timestamp: Utc::now(),
            issues: None,
            quality_gate: QualityGateStatus::Inactive,
            reference: None,
            reset_reference: BTreeSet::new(),
        }
    }

    pub fn with_issues(mut self, issues: Report, quality_gate: QualityGateStatus) -> Self {
        self.issues = Some(issues);
        self.quality_gate = quality_gate;
        self
    }

    pub fn is_building(&self) -> bool {
        self.status.is_none()
    }
}

/// Read-only view of the runs of one or more jobs.
pub trait RunHistory {
    /// Most recent run of `job`, completed or not.
    fn latest(&self, job: &str) -> Option<RunId>;

    /// Run of the same job immediately before `run`. `run` itself need not be recorded.
    fn previous(&self, run: &RunId) -> Option<RunId>;

    fn find(&self, job: &str, number: u64) -> Option<RunId>;

    fn attached_issue_set(&self, run: &RunId) -> Option<&Report>;

    /// `None` while the run is still building.
    fn overall_status(&self, run: &RunId) -> Option<BuildStatus>;

    fn quality_gate_status(&self, run: &RunId) -> QualityGateStatus;

    fn is_reference_reset(&self, _run: &RunId, _analysis_id: &str) -> bool {
        false
    }
}

/// Iterator over a job's runs from `start` backwards.
pub struct HistoryWalk<'a> {
    history: &'a dyn RunHistory,
    next: Option<RunId>,
}

impl<'a> HistoryWalk<'a> {
    pub fn new(history: &'a dyn RunHistory, start: Option<RunId>) -> Self {
        Self {
            history,
            next: start,
        }
    }
}

impl Iterator for HistoryWalk<'_> {
    type Item = RunId;

    fn next(&mut self) -> Option<RunId> {
        let current = self.next.take()?;
        // Stop on a provider that does not move strictly backwards
        self.next = self
            .history
            .previous(&current)
            .filter(|prev| prev.job == current.job && prev.number < current.number);
        Some(current)
    }
}

/// In-memory run history, runs of each job kept in ascending build order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildHistory {
    #[serde(default)]
    jobs: BTreeMap<String, Vec<RunRecord>>,
}

impl BuildHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` as a run of `job`, replacing a run with the same number.
    pub fn add_run(&mut self, job: &str, record: RunRecord) -> RunId {
        let id = RunId::new(job, record.number);
        let runs = self.jobs.entry(job.to_string()).or_default();
        match runs.binary_search_by_key(&record.number, |r| r.number) {
            Ok(pos) => runs[pos] = record,
            Err(pos) => runs.insert(pos, record),
        }
        id
    }

    pub fn record(&self, run: &RunId) -> Option<&RunRecord> {
        let runs = self.jobs.get(&run.job)?;
        runs.binary_search_by_key(&run.number, |r| r.number)
            .ok()
            .map(|pos| &runs[pos])
    }

    pub fn record_mut(&mut self, run: &RunId) -> Option<&mut RunRecord> {
        let runs = self.jobs.get_mut(&run.job)?;
        runs.binary_search_by_key(&run.number, |r| r.number)
            .ok()
            .map(move |pos| &mut runs[pos])
    }

    pub fn runs(&self, job: &str) -> &[RunRecord] {
        self.jobs.get(job).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    /// Number the next run of `job` gets when none is given.
    pub fn next_number(&self, job: &str) -> u64 {
        self.runs(job).last().map(|r| r.number + 1).unwrap_or(1)
    }

    /// Let `run` serve as reference for `analysis_id` even if its quality gate was missed.
    ///
    /// Returns `false` when the run is unknown.
    pub fn reset_reference(&mut self, run: &RunId, analysis_id: &str) -> bool {
        match self.record_mut(run) {
            Some(record) => {
                record.reset_reference.insert(analysis_id.to_string());
                true
            }
            None => false,
        }
    }
}

impl RunHistory for BuildHistory {
    fn latest(&self, job: &str) -> Option<RunId> {
        self.runs(job).last().map(|r| RunId::new(job, r.number))
    }

    fn previous(&self, run: &RunId) -> Option<RunId> {
        let runs = self.runs(&run.job);
        let pos = runs.partition_point(|r| r.number < run.number);
        pos.checked_sub(1)
            .map(|prev| RunId::new(run.job.as_str(), runs[prev].number))
    }

    fn find(&self, job: &str, number: u64) -> Option<RunId> {
        let id = RunId::new(job, number);
        self.record(&id).map(|_| id)
    }

    fn attached_issue_set(&self, run: &RunId) -> Option<&Report> {
        self.record(run)?.issues.as_ref()
    }

    fn overall_status(&self, run: &RunId) -> Option<BuildStatus> {
        self.record(run)?.status
    }

    fn quality_gate_status(&self, run: &RunId) -> QualityGateStatus {
        self.record(run)
            .map(|r| r.quality_gate)
            .unwrap_or_default()
    }

    fn is_reference_reset(&self, run: &RunId, analysis_id: &str) -> bool {
        self.record(run)
            .is_some_and(|r| r.reset_reference.contains(analysis_id))
    }
}
