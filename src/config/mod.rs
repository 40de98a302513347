//! Configuration module for Warngate
//!
//! This module handles:
//! - Project-level configuration (warngate.toml / .warngaterc.json)
//! - Reference build selection
//! - Quality gates and legacy thresholds
//! - Health report and fingerprint settings

mod project_config;

pub use project_config::{
    load_config_file,
    load_project_config,
    ConfigError,
    FingerprintConfig,
    GateConfig,
    HealthConfig,
    ProjectConfig,
};
