//! Health scoring
//!
//! Maps the number of issues at or above a minimum severity to a score
//! between 0 and 100.
//!
//! # Formula
//!
//! ```text
//! count <= healthy    -> 100
//! count >= unhealthy  -> 0
//! otherwise           -> 100 - (count - healthy) * 100 / (unhealthy - healthy)   (floor)
//! ```
//!
//! No score is produced unless `healthy < unhealthy`.

use crate::models::{Report, Severity};
use serde::{Deserialize, Serialize};

/// Thresholds of the health report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDescriptor {
    /// Up to this many issues the build is 100% healthy
    pub healthy: u32,
    /// From this many issues on the build is 0% healthy
    pub unhealthy: u32,
    pub minimum_severity: Severity,
}

impl Default for HealthDescriptor {
    fn default() -> Self {
        Self {
            healthy: 0,
            unhealthy: 0,
            minimum_severity: Severity::WarningLow,
        }
    }
}

impl HealthDescriptor {
    pub fn new(healthy: u32, unhealthy: u32, minimum_severity: Severity) -> Self {
        Self {
            healthy,
            unhealthy,
            minimum_severity,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.healthy < self.unhealthy
    }

    /// Health of `report`, counting issues at or above the minimum severity.
    pub fn compute(&self, report: &Report) -> Option<HealthReport> {
        self.compute_for_count(report.count_at_least(self.minimum_severity))
    }

    pub fn compute_for_count(&self, count: usize) -> Option<HealthReport> {
        if !self.is_enabled() {
            return None;
        }
        let count = count as u64;
        let healthy = u64::from(self.healthy);
        let unhealthy = u64::from(self.unhealthy);

        let score = if count <= healthy {
            100
        } else if count >= unhealthy {
            0
        } else {
            100 - (count - healthy) * 100 / (unhealthy - healthy)
        };
        // 0..=100 by construction
        let score = score as u8;

        Some(HealthReport {
            score,
            icon: HealthIcon::from_score(score),
            description: describe(count),
        })
    }
}

fn describe(count: u64) -> String {
    match count {
        0 => "No warnings found".to_string(),
        1 => "1 warning found".to_string(),
        n => format!("{} warnings found", n),
    }
}

/// Icon band of a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthIcon {
    #[serde(rename = "80plus")]
    Plus80,
    #[serde(rename = "60to79")]
    From60To79,
    #[serde(rename = "40to59")]
    From40To59,
    #[serde(rename = "20to39")]
    From20To39,
    #[serde(rename = "00to19")]
    From00To19,
}

impl HealthIcon {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => HealthIcon::Plus80,
            s if s >= 60 => HealthIcon::From60To79,
            s if s >= 40 => HealthIcon::From40To59,
            s if s >= 20 => HealthIcon::From20To39,
            _ => HealthIcon::From00To19,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthIcon::Plus80 => "80plus",
            HealthIcon::From60To79 => "60to79",
            HealthIcon::From40To59 => "40to59",
            HealthIcon::From20To39 => "20to39",
            HealthIcon::From00To19 => "00to19",
        }
    }
}

impl std::fmt::Display for HealthIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: u8,
    pub icon: HealthIcon,
    pub description: String,
}
