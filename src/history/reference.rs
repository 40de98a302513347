//! Reference build resolution
//!
//! Walks the history of the reference job backwards and picks the first
//! completed run with attached issues that satisfies the configured
//! filters. A reset on the last completed run of the current job overrides
//! the walk for the next build. Resolution never fails: anything that
//! cannot be resolved yields no reference plus a message saying why.

use super::{BuildStatus, HistoryWalk, RunHistory, RunId};
use crate::gates::QualityGateStatus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How the reference build is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Job to take the reference from; empty means the current job
    pub job: String,
    /// Use exactly this build of the reference job
    pub build: Option<u64>,
    /// Accept runs regardless of their own quality gate result
    pub ignore_quality_gate: bool,
    /// Only accept runs whose overall result is SUCCESS
    pub overall_result_must_be_success: bool,
    /// Analysis id matched against reference resets
    pub analysis_id: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            job: String::new(),
            build: None,
            ignore_quality_gate: true,
            overall_result_must_be_success: false,
            analysis_id: String::new(),
        }
    }
}

impl ReferenceConfig {
    fn criteria(&self) -> String {
        let job = if self.overall_result_must_be_success {
            "NO_JOB_FAILURE"
        } else {
            "IGNORE_JOB_RESULT"
        };
        let gate = if self.ignore_quality_gate {
            "IGNORE_QUALITY_GATE"
        } else {
            "SUCCESSFUL_QUALITY_GATE"
        };
        format!("{} - {}", job, gate)
    }
}

/// Outcome of a resolution: the reference, if any, and the rationale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceResolution {
    pub reference: Option<RunId>,
    pub messages: Vec<String>,
}

impl ReferenceResolution {
    fn log(&mut self, message: String) {
        info!("{}", message);
        self.messages.push(message);
    }
}

pub struct ReferenceResolver<'a> {
    history: &'a dyn RunHistory,
    config: &'a ReferenceConfig,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(history: &'a dyn RunHistory, config: &'a ReferenceConfig) -> Self {
        Self { history, config }
    }

    /// Find the run to compare `current` against.
    pub fn resolve(&self, current: &RunId) -> ReferenceResolution {
        let mut resolution = ReferenceResolution::default();

        let job = if self.config.job.is_empty() {
            current.job.as_str()
        } else {
            resolution.log(format!("Configured reference job: '{}'", self.config.job));
            self.config.job.as_str()
        };

        if let Some(previous) = self.reset_previous(current) {
            resolution.log(
                "Resetting reference build, ignoring quality gate result for one build".to_string(),
            );
            resolution.reference = Some(previous);
            return resolution;
        }

        if let Some(number) = self.config.build {
            let pinned = self.resolve_pinned(job, number, current, &mut resolution);
            resolution.reference = pinned;
            return resolution;
        }

        let start = if job == current.job {
            self.history.previous(current)
        } else {
            self.history.latest(job)
        };
        if start.is_none() {
            resolution.log(format!("Reference job '{}' has no completed builds", job));
        }

        for run in HistoryWalk::new(self.history, start) {
            if self.is_eligible(&run) {
                resolution.log(format!("Found reference build '#{}'", run.number));
                resolution.reference = Some(run);
                return resolution;
            }
        }

        resolution.log(format!(
            "No valid reference build found that meets the criteria ({})",
            self.config.criteria()
        ));
        resolution
    }

    fn resolve_pinned(
        &self,
        job: &str,
        number: u64,
        current: &RunId,
        resolution: &mut ReferenceResolution,
    ) -> Option<RunId> {
        let Some(run) = self.history.find(job, number) else {
            resolution.log(format!(
                "Reference build '#{}' of job '{}' not found",
                number, job
            ));
            return None;
        };
        if &run == current {
            resolution.log("A build cannot be its own reference".to_string());
            return None;
        }
        if self.history.overall_status(&run).is_none()
            || self.history.attached_issue_set(&run).is_none()
        {
            resolution.log(format!(
                "Reference build '#{}' has no recorded issues",
                number
            ));
            return None;
        }
        resolution.log(format!("Using configured reference build '#{}'", number));
        Some(run)
    }

    fn is_eligible(&self, run: &RunId) -> bool {
        let Some(status) = self.history.overall_status(run) else {
            debug!("Skipping {}: still building", run);
            return false;
        };
        if self.history.attached_issue_set(run).is_none() {
            debug!("Skipping {}: no issues recorded", run);
            return false;
        }
        if self.config.overall_result_must_be_success && status != BuildStatus::Success {
            debug!("Skipping {}: result is {}", run, status);
            return false;
        }
        if !self.config.ignore_quality_gate
            && self.history.quality_gate_status(run) != QualityGateStatus::Passed
        {
            debug!("Skipping {}: quality gate not passed", run);
            return false;
        }
        true
    }

    /// The last completed run of the current job, if it was reset for this analysis id.
    ///
    /// A reset only ever affects the build directly after the reset run, and it
    /// bypasses every other filter.
    fn reset_previous(&self, current: &RunId) -> Option<RunId> {
        if self.config.analysis_id.is_empty() {
            return None;
        }
        let previous = HistoryWalk::new(self.history, self.history.previous(current))
            .find(|run| self.history.overall_status(run).is_some())?;
        if self.history.attached_issue_set(&previous).is_none()
            || !self
                .history
                .is_reference_reset(&previous, &self.config.analysis_id)
        {
            return None;
        }
        Some(previous)
    }
}
