//! Legacy scalar thresholds
//!
//! Older configurations set thresholds as `<unstable|failed>_<total|new|delta>_<all|error|high|normal|low>`
//! keys (camel case such as `unstableTotalAll` is accepted too). A value of 0
//! means "not set" and produces no gate.

use super::{Criticality, Metric, QualityGate, Scope};
use crate::models::Severity;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

static LEGACY_KEY: OnceLock<Regex> = OnceLock::new();

fn legacy_key() -> &'static Regex {
    LEGACY_KEY.get_or_init(|| {
        Regex::new(r"(?i)^(unstable|failed)_?(total|new|delta)_?(all|error|high|normal|low)$")
            .unwrap()
    })
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown threshold '{0}' (expected <unstable|failed>_<total|new|delta>_<all|error|high|normal|low>)")]
pub struct UnknownThreshold(pub String);

fn parse_key(key: &str) -> Option<(Criticality, Metric)> {
    let caps = legacy_key().captures(key)?;
    let criticality = match caps[1].to_ascii_lowercase().as_str() {
        "unstable" => Criticality::Unstable,
        _ => Criticality::Failure,
    };
    let scope = match caps[2].to_ascii_lowercase().as_str() {
        "total" => Scope::Total,
        "new" => Scope::New,
        _ => Scope::Delta,
    };
    let severity = match caps[3].to_ascii_lowercase().as_str() {
        "all" => None,
        "error" => Some(Severity::Error),
        "high" => Some(Severity::WarningHigh),
        "normal" => Some(Severity::WarningNormal),
        _ => Some(Severity::WarningLow),
    };
    Some((criticality, Metric::from_parts(scope, severity)))
}

/// Gate for one legacy threshold, or `None` when the value is 0.
pub fn legacy_gate(key: &str, value: u32) -> Result<Option<QualityGate>, UnknownThreshold> {
    let (criticality, metric) =
        parse_key(key).ok_or_else(|| UnknownThreshold(key.to_string()))?;
    Ok((value > 0).then(|| QualityGate::new(metric, value, criticality)))
}

/// Expand a table of legacy thresholds into gates.
///
/// Unstable gates come before failed ones, each in metric order.
pub fn expand_legacy_thresholds(
    thresholds: &BTreeMap<String, u32>,
) -> Result<Vec<QualityGate>, UnknownThreshold> {
    let mut gates = Vec::new();
    for (key, &value) in thresholds {
        if let Some(gate) = legacy_gate(key, value)? {
            gates.push(gate);
        }
    }
    gates.sort_by_key(|g| {
        let rank = Metric::ALL.iter().position(|m| *m == g.metric);
        (g.criticality == Criticality::Failure, rank)
    });
    Ok(gates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snake_and_camel_case() {
        assert_eq!(
            parse_key("unstable_total_all"),
            Some((Criticality::Unstable, Metric::Total))
        );
        assert_eq!(
            parse_key("failedNewHigh"),
            Some((Criticality::Failure, Metric::NewHigh))
        );
        assert_eq!(
            parse_key("FAILED_DELTA_ERROR"),
            Some((Criticality::Failure, Metric::DeltaError))
        );
        assert_eq!(parse_key("unstable_total"), None);
        assert_eq!(parse_key("broken_total_all"), None);
    }

    #[test]
    fn test_zero_means_unset() {
        assert_eq!(legacy_gate("unstable_new_all", 0), Ok(None));
        assert_eq!(
            legacy_gate("unstable_new_all", 2),
            Ok(Some(QualityGate::new(Metric::New, 2, Criticality::Unstable)))
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = legacy_gate("unstable_total_critical", 1).unwrap_err();
        assert_eq!(err, UnknownThreshold("unstable_total_critical".to_string()));
    }

    #[test]
    fn test_expand_orders_unstable_first() {
        let thresholds = BTreeMap::from([
            ("failed_total_all".to_string(), 10),
            ("unstable_new_high".to_string(), 1),
            ("unstable_total_all".to_string(), 5),
            ("failed_delta_all".to_string(), 0),
        ]);
        let gates = expand_legacy_thresholds(&thresholds).unwrap();
        assert_eq!(
            gates,
            vec![
                QualityGate::new(Metric::Total, 5, Criticality::Unstable),
                QualityGate::new(Metric::NewHigh, 1, Criticality::Unstable),
                QualityGate::new(Metric::Total, 10, Criticality::Failure),
            ]
        );
    }
}
