use serde_json::Value;

use crate::candidate::fields::object_get_case_insensitive;
use crate::candidate::Candidate;
use crate::error::OptimizeError;
use crate::optimizer::Budget;

/// `kols` is the field name older discovery clients send.
const CANDIDATE_KEYS: &[&str] = &["candidates", "kols"];

#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub candidates: Vec<Candidate>,
    pub budget: Budget,
}

impl OptimizeRequest {
    pub fn new(candidates: Vec<Candidate>, budget: f64) -> Result<Self, OptimizeError> {
        if candidates.is_empty() {
            return Err(OptimizeError::invalid("candidates must not be empty"));
        }
        Ok(Self {
            candidates,
            budget: Budget::new(budget)?,
        })
    }
}

/// Checks a raw request payload and reports the first violated condition.
pub fn validate_request(payload: &Value) -> Result<OptimizeRequest, OptimizeError> {
    let Some(object) = payload.as_object() else {
        return Err(OptimizeError::invalid("request body must be a JSON object"));
    };

    let raw_candidates = CANDIDATE_KEYS
        .iter()
        .find_map(|key| object_get_case_insensitive(object, key))
        .filter(|value| !value.is_null())
        .ok_or_else(|| OptimizeError::invalid("candidates are required"))?;
    let Some(entries) = raw_candidates.as_array() else {
        return Err(OptimizeError::invalid("candidates must be an array"));
    };
    if entries.is_empty() {
        return Err(OptimizeError::invalid("candidates must not be empty"));
    }

    let raw_budget = object_get_case_insensitive(object, "budget")
        .filter(|value| !value.is_null())
        .ok_or_else(|| OptimizeError::invalid("budget is required"))?;
    let Some(amount) = raw_budget.as_f64() else {
        return Err(OptimizeError::invalid("budget must be a number"));
    };

    OptimizeRequest::new(
        entries.iter().cloned().map(Candidate::from_value).collect(),
        amount,
    )
}
