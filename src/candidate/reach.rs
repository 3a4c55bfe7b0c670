//! Expected-views estimates.
//!
//! Catalog rows and forecast responses spell percentiles in more than one way
//! (`p50` and `views_p50` name the same quantity). Everything is folded into
//! [`ReachEstimate`] on ingestion so nothing downstream re-parses raw shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::candidate::fields::{embedded_object, object_get_case_insensitive, to_f64};

const MEAN_KEYS: &[&str] = &["mean", "views_mean"];
const P10_KEYS: &[&str] = &["p10", "views_p10"];
const P50_KEYS: &[&str] = &["p50", "views_p50"];
const P90_KEYS: &[&str] = &["p90", "views_p90"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachDistribution {
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

impl ReachDistribution {
    pub fn uniform(value: f64) -> Self {
        Self {
            mean: value,
            p10: value,
            p50: value,
            p90: value,
        }
    }

    /// Reads a percentile object. A p50 is required; the other fields fall
    /// back to it only when absent.
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let p50 = first_populated(object, P50_KEYS)?;
        Some(Self {
            mean: first_populated(object, MEAN_KEYS).unwrap_or(p50),
            p10: first_populated(object, P10_KEYS).unwrap_or(p50),
            p50,
            p90: first_populated(object, P90_KEYS).unwrap_or(p50),
        })
    }
}

/// A point estimate or a percentile distribution whose p50 is the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReachEstimate {
    Scalar(f64),
    Distribution(ReachDistribution),
}

impl ReachEstimate {
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(number) = to_f64(value) {
            return Some(Self::Scalar(number));
        }
        let object = embedded_object(value)?;
        ReachDistribution::from_object(&object).map(Self::Distribution)
    }

    pub fn point(&self) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::Distribution(distribution) => distribution.p50,
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::Distribution(distribution) => distribution.mean,
        }
    }

    pub fn is_distribution(&self) -> bool {
        matches!(self, Self::Distribution(_))
    }

    pub fn to_distribution(&self) -> ReachDistribution {
        match self {
            Self::Scalar(value) => ReachDistribution::uniform(*value),
            Self::Distribution(distribution) => *distribution,
        }
    }
}

// A zero under one spelling yields to a non-zero under another; an explicit
// zero with no alternative is kept as is.
fn first_populated(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let mut present = keys
        .iter()
        .filter_map(|key| object_get_case_insensitive(object, key))
        .filter_map(to_f64);
    let first = present.next()?;
    if first != 0.0 {
        return Some(first);
    }
    Some(present.find(|value| *value != 0.0).unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn both_percentile_spellings_are_recognised() {
        let short = ReachEstimate::from_value(&json!({ "p10": 100, "p50": 400, "p90": 900 }))
            .expect("short keys");
        let long = ReachEstimate::from_value(&json!({
            "views_p10": 100,
            "views_p50": 400,
            "views_p90": 900
        }))
        .expect("long keys");
        assert_eq!(short, long);
        assert_eq!(short.point(), 400.0);
    }

    #[test]
    fn prefers_first_populated_spelling() {
        let both = ReachEstimate::from_value(&json!({ "p50": 500, "views_p50": 700 }))
            .expect("both keys");
        assert_eq!(both.point(), 500.0);

        let zero_first = ReachEstimate::from_value(&json!({ "p50": 0, "views_p50": 700 }))
            .expect("zero short key");
        assert_eq!(zero_first.point(), 700.0);
    }

    #[test]
    fn keeps_present_zeros() {
        let empty = ReachEstimate::from_value(&json!({ "mean": 0, "p10": 0, "p50": 0, "p90": 0 }))
            .expect("all-zero distribution");
        assert_eq!(empty, ReachEstimate::Distribution(ReachDistribution::uniform(0.0)));

        let skewed = ReachEstimate::from_value(&json!({
            "mean": 5000,
            "p10": 0,
            "p50": 4000,
            "p90": 9000
        }))
        .expect("distribution with zero p10");
        assert_eq!(skewed.to_distribution().p10, 0.0);

        let zero_alias = ReachEstimate::from_value(&json!({ "p50": 400, "p10": 0, "views_p10": 0 }))
            .expect("zero under both spellings");
        assert_eq!(zero_alias.to_distribution().p10, 0.0);
    }

    #[test]
    fn point_is_median_not_mean_or_p90() {
        let estimate = ReachEstimate::from_value(&json!({
            "mean": 2000,
            "p10": 300,
            "p50": 800,
            "p90": 5000
        }))
        .expect("distribution");
        assert_eq!(estimate.point(), 800.0);
        assert_eq!(estimate.mean(), 2000.0);
    }

    #[test]
    fn decodes_distribution_stored_as_json_text() {
        let estimate = ReachEstimate::from_value(&json!("{\"views_p50\": 1500}"))
            .expect("embedded distribution");
        assert!(estimate.is_distribution());
        assert_eq!(
            estimate.to_distribution(),
            ReachDistribution::uniform(1500.0)
        );
    }

    #[test]
    fn scalar_replicates_across_percentiles() {
        let estimate = ReachEstimate::from_value(&json!(3200)).expect("scalar");
        assert!(!estimate.is_distribution());
        let distribution = estimate.to_distribution();
        assert_eq!(distribution.mean, 3200.0);
        assert_eq!(distribution.p10, 3200.0);
        assert_eq!(distribution.p90, 3200.0);
    }

    #[test]
    fn distribution_without_median_is_rejected() {
        assert!(ReachEstimate::from_value(&json!({ "mean": 10, "p90": 20 })).is_none());
        assert!(ReachEstimate::from_value(&json!(null)).is_none());
    }

    #[test]
    fn serializes_scalar_as_number_and_distribution_as_object() {
        let scalar = serde_json::to_value(ReachEstimate::Scalar(12.0)).expect("scalar json");
        assert_eq!(scalar, json!(12.0));
        let distribution = serde_json::to_value(ReachEstimate::Distribution(
            ReachDistribution::uniform(5.0),
        ))
        .expect("distribution json");
        assert_eq!(
            distribution,
            json!({ "mean": 5.0, "p10": 5.0, "p50": 5.0, "p90": 5.0 })
        );
    }
}
