//! JSON reporter
//!
//! Outputs the full AnalysisResult as pretty-printed JSON.

use crate::pipeline::AnalysisResult;
use anyhow::Result;

/// Render result as JSON
pub fn render(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
