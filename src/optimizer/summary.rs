use serde_json::Value;
use thiserror::Error;

use crate::candidate::fields::{object_get_case_insensitive, to_f64};
use crate::candidate::reach::ReachEstimate;
use crate::candidate::Candidate;
use crate::optimizer::{SelectionResult, Strategy};

#[derive(Debug, Error)]
#[error("unrecognised optimization response: {0}")]
pub struct ResponseShapeError(pub String);

/// Reads a saved optimization response in either the local or the
/// forecast-backed shape.
pub fn parse_response(value: &Value) -> Result<SelectionResult, ResponseShapeError> {
    let object = value
        .as_object()
        .ok_or_else(|| ResponseShapeError("expected a JSON object".to_string()))?;

    let selected = object_get_case_insensitive(object, "optimizedKols")
        .and_then(Value::as_array)
        .ok_or_else(|| ResponseShapeError("missing optimizedKols array".to_string()))?
        .iter()
        .cloned()
        .map(Candidate::from_value)
        .collect::<Vec<_>>();

    let number = |keys: &[&str]| {
        keys.iter()
            .filter_map(|key| object.get(*key))
            .find_map(to_f64)
    };

    let total_cost = number(&["total_cost", "totalCost"])
        .ok_or_else(|| ResponseShapeError("missing total cost".to_string()))?;
    let forecast = object
        .get("expected_views")
        .and_then(ReachEstimate::from_value)
        .map(|reach| ReachEstimate::Distribution(reach.to_distribution()));
    let expected_reach = match forecast {
        Some(reach) => reach,
        None => number(&["totalViews"])
            .map(ReachEstimate::Scalar)
            .ok_or_else(|| ResponseShapeError("missing expected views".to_string()))?,
    };
    let remaining_budget = number(&["remainingBudget"]);
    let budget = number(&["budget"])
        .or_else(|| remaining_budget.map(|remaining| remaining + total_cost))
        .ok_or_else(|| ResponseShapeError("missing budget".to_string()))?;

    Ok(SelectionResult {
        strategy: if expected_reach.is_distribution() {
            Strategy::Remote
        } else {
            Strategy::Local
        },
        budget,
        selected,
        total_cost,
        expected_reach,
        remaining_budget: remaining_budget.unwrap_or(budget - total_cost),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::candidate::reach::ReachDistribution;
    use crate::optimizer::greedy::select_greedy;
    use crate::optimizer::Budget;

    #[test]
    fn reads_local_shape() {
        let parsed = parse_response(&json!({
            "optimizedKols": [{ "channel_id": "UC2", "price": 50, "view_count": 3000 }],
            "totalCost": 50,
            "totalViews": 3000,
            "remainingBudget": 200
        }))
        .expect("local shape");
        assert_eq!(parsed.strategy, Strategy::Local);
        assert_eq!(parsed.budget, 250.0);
        assert_eq!(parsed.total_views(), 3000.0);
        assert_eq!(parsed.selected[0].id(), Some("UC2"));
    }

    #[test]
    fn reads_forecast_shape() {
        let parsed = parse_response(&json!({
            "optimizedKols": [],
            "budget": 1000,
            "total_cost": 0,
            "expected_views": 0.5,
            "remainingBudget": 1000,
            "totalCost": 0,
            "totalViews": 0.5
        }))
        .expect("forecast shape");
        assert_eq!(parsed.strategy, Strategy::Remote);
        assert_eq!(parsed.expected_distribution().p90, 0.5);
        assert_eq!(parsed.remaining_budget, 1000.0);
    }

    #[test]
    fn round_trips_serialized_local_result() {
        let candidates = vec![
            Candidate::from_value(json!({ "id": 1, "price": 100, "view_count": 5000 })),
            Candidate::from_value(json!({ "id": 2, "price": 50, "view_count": 3000 })),
        ];
        let result = select_greedy(&candidates, Budget::new(120.0).expect("budget"));
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(parse_response(&value).expect("parse"), result);
    }

    #[test]
    fn round_trips_serialized_empty_remote_result() {
        let result = SelectionResult {
            strategy: Strategy::Remote,
            budget: 100.0,
            selected: Vec::new(),
            total_cost: 0.0,
            expected_reach: ReachEstimate::Distribution(ReachDistribution::uniform(0.0)),
            remaining_budget: 100.0,
        };
        let value = serde_json::to_value(&result).expect("serialize");
        let parsed = parse_response(&value).expect("parse");
        assert_eq!(parsed.strategy, Strategy::Remote);
        assert_eq!(parsed, result);
    }

    #[test]
    fn rejects_unrelated_payloads() {
        assert!(parse_response(&json!({ "error": "Failed to optimize KOLs" })).is_err());
        assert!(parse_response(&json!({ "optimizedKols": [] })).is_err());
    }
}
