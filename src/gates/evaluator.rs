//! Quality gate evaluation
//!
//! The aggregate status is the worst status over all gates, starting from
//! PASSED. Every gate contributes one line to the trace, followed by a
//! summary line, so the result can be audited from the trace alone.

use super::{legacy, Criticality, Metric, QualityGate, QualityGateStatus, UnknownThreshold};
use crate::delta::IssuesStatistics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of a single gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub gate: QualityGate,
    pub value: i64,
    pub status: QualityGateStatus,
}

impl GateEvaluation {
    pub fn message(&self) -> String {
        format!(
            "{} - {}: {} - Quality QualityGate: {}",
            self.status,
            self.gate.metric.label(),
            self.value,
            self.gate.threshold
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateResult {
    pub status: QualityGateStatus,
    pub evaluations: Vec<GateEvaluation>,
    pub trace: Vec<String>,
}

/// Ordered list of gates to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityGateEvaluator {
    gates: Vec<QualityGate>,
}

impl QualityGateEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_quality_gate(&mut self, metric: Metric, threshold: u32, criticality: Criticality) {
        self.gates.push(QualityGate::new(metric, threshold, criticality));
    }

    pub fn add_all(&mut self, gates: impl IntoIterator<Item = QualityGate>) {
        self.gates.extend(gates);
    }

    /// Append the gates of legacy scalar thresholds. Gates already present are kept.
    pub fn add_legacy_thresholds(
        &mut self,
        thresholds: &BTreeMap<String, u32>,
    ) -> Result<(), UnknownThreshold> {
        let gates = legacy::expand_legacy_thresholds(thresholds)?;
        self.gates.extend(gates);
        Ok(())
    }

    pub fn gates(&self) -> &[QualityGate] {
        &self.gates
    }

    pub fn is_enabled(&self) -> bool {
        !self.gates.is_empty()
    }

    pub fn evaluate(&self, stats: &IssuesStatistics) -> QualityGateResult {
        if self.gates.is_empty() {
            return QualityGateResult {
                status: QualityGateStatus::Inactive,
                evaluations: Vec::new(),
                trace: vec!["No quality gates have been set - skipping".to_string()],
            };
        }

        let mut status = QualityGateStatus::Passed;
        let mut evaluations = Vec::with_capacity(self.gates.len());
        let mut trace = Vec::with_capacity(self.gates.len() + 1);
        for gate in &self.gates {
            let value = gate.metric.value(stats);
            let gate_status = if value >= i64::from(gate.threshold) {
                gate.criticality.status()
            } else {
                QualityGateStatus::Passed
            };
            status = status.worse(gate_status);

            let evaluation = GateEvaluation {
                gate: *gate,
                value,
                status: gate_status,
            };
            debug!("{}", evaluation.message());
            trace.push(evaluation.message());
            evaluations.push(evaluation);
        }

        if status == QualityGateStatus::Passed {
            trace.push("All quality gates have been passed".to_string());
        } else {
            trace.push(format!(
                "Some quality gates have been missed: overall result is {}",
                status
            ));
        }

        QualityGateResult {
            status,
            evaluations,
            trace,
        }
    }
}
