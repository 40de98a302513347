//! Project-level configuration support
//!
//! Loads per-project configuration from `warngate.toml` or `.warngaterc.json`
//! in the workspace root. Values are validated before any analysis runs, so
//! the engine only ever sees well-formed gates and thresholds.
//!
//! # Configuration Format
//!
//! ```toml
//! # warngate.toml
//!
//! [reference]
//! job = "main"                  # empty = same job
//! ignore_quality_gate = false
//! overall_result_must_be_success = true
//! analysis_id = "gcc"
//!
//! [[quality_gates]]
//! metric = "NEW"
//! threshold = 1
//! criticality = "FAILURE"
//!
//! [thresholds]                  # legacy style, 0 = unset
//! unstable_total_all = 20
//!
//! [health]
//! healthy = 5
//! unhealthy = 25
//! minimum_severity = "normal"
//!
//! [fingerprint]
//! context_lines = 3
//! timeout_secs = 60
//! ```

use crate::gates::{Criticality, Metric, QualityGateEvaluator, UnknownThreshold};
use crate::history::ReferenceConfig;
use crate::models::Severity;
use crate::pipeline::AnalysisOptions;
use crate::scoring::HealthDescriptor;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format: {0} (use .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Quality gate {metric} has negative threshold {value}")]
    NegativeThreshold { metric: String, value: i64 },

    #[error("Threshold {value} of {metric} is too large")]
    ThresholdTooLarge { metric: String, value: i64 },

    #[error("{0}")]
    UnknownMetric(String),

    #[error("{0}")]
    UnknownCriticality(String),

    #[error(transparent)]
    UnknownThreshold(#[from] UnknownThreshold),

    #[error("Health threshold '{name}' must not be negative (got {value})")]
    NegativeHealthThreshold { name: &'static str, value: i64 },

    #[error("{0}")]
    UnknownSeverity(String),
}

/// One `[[quality_gates]]` entry as written in the file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateConfig {
    pub metric: String,
    pub threshold: i64,
    #[serde(default = "default_criticality")]
    pub criticality: String,
}

fn default_criticality() -> String {
    "UNSTABLE".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub healthy: i64,
    pub unhealthy: i64,
    pub minimum_severity: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            healthy: 0,
            unhealthy: 0,
            minimum_severity: "low".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub context_lines: usize,
    /// Wall-clock budget for reading source files
    pub timeout_secs: Option<u64>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            context_lines: crate::fingerprint::DEFAULT_CONTEXT_LINES,
            timeout_secs: None,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub quality_gates: Vec<GateConfig>,

    /// Legacy scalar thresholds, e.g. `failed_new_high = 1`
    #[serde(default)]
    pub thresholds: BTreeMap<String, i64>,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,
}

impl ProjectConfig {
    /// Build the evaluator: `[[quality_gates]]` first, then legacy thresholds.
    pub fn quality_gates(&self) -> Result<QualityGateEvaluator, ConfigError> {
        let mut evaluator = QualityGateEvaluator::new();
        for gate in &self.quality_gates {
            let metric: Metric = gate.metric.parse().map_err(ConfigError::UnknownMetric)?;
            let criticality: Criticality = gate
                .criticality
                .parse()
                .map_err(ConfigError::UnknownCriticality)?;
            let threshold = checked_threshold(&gate.metric, gate.threshold)?;
            evaluator.add_quality_gate(metric, threshold, criticality);
        }

        let mut legacy = BTreeMap::new();
        for (key, &value) in &self.thresholds {
            legacy.insert(key.clone(), checked_threshold(key, value)?);
        }
        evaluator.add_legacy_thresholds(&legacy)?;
        Ok(evaluator)
    }

    pub fn health(&self) -> Result<HealthDescriptor, ConfigError> {
        let healthy = checked_health("healthy", self.health.healthy)?;
        let unhealthy = checked_health("unhealthy", self.health.unhealthy)?;
        let minimum_severity: Severity = self
            .health
            .minimum_severity
            .parse()
            .map_err(ConfigError::UnknownSeverity)?;
        Ok(HealthDescriptor::new(healthy, unhealthy, minimum_severity))
    }

    /// Validate everything and produce the options for one analysis.
    pub fn analysis_options(&self) -> Result<AnalysisOptions, ConfigError> {
        Ok(AnalysisOptions {
            reference: self.reference.clone(),
            gates: self.quality_gates()?,
            health: self.health()?,
            context_lines: self.fingerprint.context_lines,
            timeout: self.fingerprint.timeout_secs.map(Duration::from_secs),
        })
    }
}

fn checked_threshold(metric: &str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeThreshold {
            metric: metric.to_string(),
            value,
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::ThresholdTooLarge {
        metric: metric.to_string(),
        value,
    })
}

fn checked_health(name: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeHealthThreshold { name, value });
    }
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

/// Load project configuration from the workspace root.
///
/// Tries `warngate.toml`, then `.warngaterc.json`. Without either, defaults
/// apply. A file that exists but cannot be parsed is an error.
pub fn load_project_config(workspace: &Path) -> Result<ProjectConfig, ConfigError> {
    for name in ["warngate.toml", ".warngaterc.json"] {
        let path = workspace.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            debug!("Loaded project config from {}", path.display());
            return Ok(config);
        }
    }

    debug!("No project config found, using defaults");
    Ok(ProjectConfig::default())
}

/// Load configuration from an explicit TOML or JSON file.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
