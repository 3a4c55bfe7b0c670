pub mod greedy;
pub mod remote;
pub mod summary;
pub mod validate;

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::candidate::reach::{ReachDistribution, ReachEstimate};
use crate::candidate::Candidate;
use crate::config::RemoteConfig;
use crate::error::OptimizeError;
use crate::optimizer::greedy::GreedyOptimizer;
use crate::optimizer::remote::RemoteOptimizer;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Local,
    Remote,
}

impl Strategy {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Local => "Local greedy",
            Self::Remote => "Remote forecast",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown optimizer strategy: {0}")]
pub struct StrategyParseError(pub String);

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "local" | "greedy" => Ok(Self::Local),
            "remote" | "forecast" => Ok(Self::Remote),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

/// Campaign-wide spending ceiling; always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Budget(f64);

impl Budget {
    pub fn new(value: f64) -> Result<Self, OptimizeError> {
        if !value.is_finite() {
            return Err(OptimizeError::invalid("budget must be a finite number"));
        }
        if value <= 0.0 {
            return Err(OptimizeError::invalid("budget must be greater than zero"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub strategy: Strategy,
    pub budget: f64,
    /// Chosen candidates in selection order.
    pub selected: Vec<Candidate>,
    pub total_cost: f64,
    pub expected_reach: ReachEstimate,
    /// Signed `budget - total_cost`.
    pub remaining_budget: f64,
}

impl SelectionResult {
    pub fn empty(strategy: Strategy, budget: Budget) -> Self {
        Self {
            strategy,
            budget: budget.value(),
            selected: Vec::new(),
            total_cost: 0.0,
            expected_reach: ReachEstimate::Scalar(0.0),
            remaining_budget: budget.value(),
        }
    }

    pub fn total_views(&self) -> f64 {
        self.expected_reach.mean()
    }

    pub fn expected_distribution(&self) -> ReachDistribution {
        self.expected_reach.to_distribution()
    }

    /// Remaining budget for display; never shown below zero.
    pub fn display_remaining_budget(&self) -> f64 {
        self.remaining_budget.max(0.0)
    }

    pub fn cost_per_view(&self) -> Option<f64> {
        let views = self.total_views();
        (self.total_cost > 0.0 && views > 0.0).then(|| self.total_cost / views)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireResult<'a> {
    optimized_kols: &'a [Candidate],
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<f64>,
    #[serde(rename = "total_cost", skip_serializing_if = "Option::is_none")]
    total_cost_snake: Option<f64>,
    #[serde(rename = "expected_views", skip_serializing_if = "Option::is_none")]
    expected_views: Option<ReachDistribution>,
    remaining_budget: f64,
    total_cost: f64,
    total_views: f64,
}

/// Local results use the compact camelCase shape; remote results add the
/// forecast fields and keep the camelCase totals for older consumers.
impl Serialize for SelectionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let remote = self.strategy == Strategy::Remote;
        WireResult {
            optimized_kols: &self.selected,
            budget: remote.then_some(self.budget),
            total_cost_snake: remote.then_some(self.total_cost),
            expected_views: remote.then(|| self.expected_distribution()),
            remaining_budget: self.remaining_budget,
            total_cost: self.total_cost,
            total_views: self.total_views(),
        }
        .serialize(serializer)
    }
}

#[async_trait]
pub trait Optimizer: Send + Sync {
    fn strategy(&self) -> Strategy;
    async fn optimize(
        &self,
        candidates: &[Candidate],
        budget: Budget,
    ) -> Result<SelectionResult, OptimizeError>;
}

pub fn build_optimizer(
    strategy: Strategy,
    remote: &RemoteConfig,
) -> Result<Arc<dyn Optimizer>, OptimizeError> {
    match strategy {
        Strategy::Local => Ok(Arc::new(GreedyOptimizer)),
        Strategy::Remote => Ok(Arc::new(RemoteOptimizer::from_config(remote)?)),
    }
}
