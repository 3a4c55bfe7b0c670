use async_trait::async_trait;
use tracing::debug;

use crate::candidate::reach::ReachEstimate;
use crate::candidate::Candidate;
use crate::error::OptimizeError;
use crate::optimizer::{Budget, Optimizer, SelectionResult, Strategy};

/// In-process greedy knapsack fill by reach per unit cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyOptimizer;

#[async_trait]
impl Optimizer for GreedyOptimizer {
    fn strategy(&self) -> Strategy {
        Strategy::Local
    }

    async fn optimize(
        &self,
        candidates: &[Candidate],
        budget: Budget,
    ) -> Result<SelectionResult, OptimizeError> {
        Ok(select_greedy(candidates, budget))
    }
}

#[derive(Debug, Clone, Copy)]
struct Ranked {
    index: usize,
    price: f64,
    reach: f64,
    efficiency: f64,
}

pub fn select_greedy(candidates: &[Candidate], budget: Budget) -> SelectionResult {
    let ranked = rank_by_efficiency(candidates);
    if ranked.is_empty() {
        debug!(candidates = candidates.len(), "no eligible candidates");
        return SelectionResult::empty(Strategy::Local, budget);
    }
    let (mut picked, mut total_cost) = fill_budget(&ranked, budget.value());

    if picked.is_empty() {
        // Highest-efficiency candidate that is affordable on its own.
        if let Some(best) = ranked.iter().find(|r| r.price <= budget.value()) {
            picked.push(*best);
            total_cost = best.price;
        }
    }

    let total_reach = picked.iter().map(|r| r.reach).sum::<f64>();
    let selected = picked
        .iter()
        .map(|r| candidates[r.index].clone())
        .collect::<Vec<_>>();

    debug!(
        eligible = ranked.len(),
        selected = selected.len(),
        total_cost,
        total_reach,
        "greedy selection complete"
    );

    SelectionResult {
        strategy: Strategy::Local,
        budget: budget.value(),
        selected,
        total_cost,
        expected_reach: ReachEstimate::Scalar(total_reach),
        remaining_budget: budget.value() - total_cost,
    }
}

/// Eligible candidates, best reach per cost first. The sort is stable so
/// ties keep input order.
fn rank_by_efficiency(candidates: &[Candidate]) -> Vec<Ranked> {
    let mut ranked = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let efficiency = candidate.efficiency()?;
            Some(Ranked {
                index,
                price: candidate.price()?,
                reach: candidate.reach_point()?,
                efficiency,
            })
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    ranked
}

// Skips rather than stops on a candidate that does not fit; a cheaper one
// further down may still fit. The returned total is the same sum the fit
// check used, so it never exceeds the budget.
fn fill_budget(ranked: &[Ranked], budget: f64) -> (Vec<Ranked>, f64) {
    let mut total = 0.0;
    let mut picked = Vec::new();
    for entry in ranked {
        let next = total + entry.price;
        if next <= budget {
            total = next;
            picked.push(*entry);
        }
    }
    (picked, total)
}
