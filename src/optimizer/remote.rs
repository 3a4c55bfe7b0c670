//! Forecast-backed selection delegated to an external optimization service.
//!
//! The service decides which channel ids to run and reports cost and
//! expected views; candidate records always come from the caller's input.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::candidate::fields::{object_get_case_insensitive, to_text};
use crate::candidate::reach::ReachEstimate;
use crate::candidate::Candidate;
use crate::config::RemoteConfig;
use crate::error::OptimizeError;
use crate::optimizer::{Budget, Optimizer, SelectionResult, Strategy};

pub const OPTIMIZE_PATH: &str = "/optimize";
const SELECTED_ID_KEYS: &[&str] = &["selected_channel_ids", "channel_ids"];
const MAX_REDIRECTS: usize = 10;
const BODY_PREVIEW_CHARS: usize = 180;

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    budget: f64,
    channel_ids: Vec<&'a str>,
}

/// The decision part of an upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamSelection {
    pub channel_ids: Vec<String>,
    pub total_cost: f64,
    pub expected_views: ReachEstimate,
}

impl UpstreamSelection {
    pub fn from_value(value: &Value) -> Result<Self, OptimizeError> {
        let object = value
            .as_object()
            .ok_or_else(|| OptimizeError::bad_upstream("response is not a JSON object"))?;

        let ids = SELECTED_ID_KEYS
            .iter()
            .find_map(|key| object_get_case_insensitive(object, key))
            .and_then(Value::as_array)
            .ok_or_else(|| OptimizeError::bad_upstream("missing selected channel id list"))?;
        let channel_ids = ids
            .iter()
            .map(|id| {
                to_text(id).ok_or_else(|| {
                    OptimizeError::bad_upstream(format!("invalid channel id in response: {id}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_cost = object_get_case_insensitive(object, "total_cost")
            .and_then(Value::as_f64)
            .filter(|cost| cost.is_finite())
            .ok_or_else(|| OptimizeError::bad_upstream("total_cost is missing or not a number"))?;

        let expected_views = object_get_case_insensitive(object, "expected_views")
            .and_then(ReachEstimate::from_value)
            .ok_or_else(|| OptimizeError::bad_upstream("expected_views is missing or malformed"))?;

        Ok(Self {
            channel_ids,
            total_cost,
            expected_views,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RemoteOptimizer {
    client: Client,
    endpoint: String,
}

impl RemoteOptimizer {
    pub fn from_config(config: &RemoteConfig) -> Result<Self, OptimizeError> {
        let endpoint = endpoint_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(concat!("kol-optimizer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| OptimizeError::Configuration(format!("failed building HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_selection(
        &self,
        channel_ids: Vec<&str>,
        budget: Budget,
    ) -> Result<UpstreamSelection, OptimizeError> {
        let body = UpstreamRequest {
            budget: budget.value(),
            channel_ids,
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
            warn!(endpoint = %self.endpoint, %status, "upstream optimizer rejected request");
            return Err(OptimizeError::Upstream {
                status: status.as_u16(),
                body: preview,
            });
        }
        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| OptimizeError::bad_upstream(format!("invalid JSON: {e}")))?;
        UpstreamSelection::from_value(&payload)
    }
}

#[async_trait]
impl Optimizer for RemoteOptimizer {
    fn strategy(&self) -> Strategy {
        Strategy::Remote
    }

    async fn optimize(
        &self,
        candidates: &[Candidate],
        budget: Budget,
    ) -> Result<SelectionResult, OptimizeError> {
        let channel_ids = channel_ids(candidates);
        if channel_ids.is_empty() {
            return Err(OptimizeError::invalid(
                "candidates must carry an id or channel_id",
            ));
        }
        let upstream = self.request_selection(channel_ids, budget).await?;
        let result = reconcile(candidates, &upstream, budget);
        debug!(
            requested = candidates.len(),
            returned = upstream.channel_ids.len(),
            matched = result.selected.len(),
            "reconciled upstream selection"
        );
        Ok(result)
    }
}

/// `base_url` + [`OPTIMIZE_PATH`], with trailing slashes on the base removed.
pub fn endpoint_url(base_url: &str) -> Result<String, OptimizeError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(OptimizeError::Configuration(
            "remote.base_url is not set".to_string(),
        ));
    }
    Ok(format!("{trimmed}{OPTIMIZE_PATH}"))
}

/// Distinct candidate ids in input order.
pub fn channel_ids(candidates: &[Candidate]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    candidates
        .iter()
        .filter_map(Candidate::id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Maps the upstream decision back onto the caller's own records. Cost and
/// reach are taken from upstream as reported.
pub fn reconcile(
    candidates: &[Candidate],
    upstream: &UpstreamSelection,
    budget: Budget,
) -> SelectionResult {
    let wanted = upstream
        .channel_ids
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>();
    let mut emitted = BTreeSet::new();
    let mut selected = Vec::new();
    for candidate in candidates {
        let Some(id) = candidate.id() else {
            continue;
        };
        if wanted.contains(id) && emitted.insert(id) {
            selected.push(candidate.clone());
        }
    }
    if emitted.len() < wanted.len() {
        warn!(
            unknown = wanted.len() - emitted.len(),
            "upstream selected ids that were not in the request"
        );
    }

    SelectionResult {
        strategy: Strategy::Remote,
        budget: budget.value(),
        selected,
        total_cost: upstream.total_cost,
        expected_reach: ReachEstimate::Distribution(upstream.expected_views.to_distribution()),
        remaining_budget: budget.value() - upstream.total_cost,
    }
}
