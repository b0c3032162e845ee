//! Budget-constrained resource allocation: an exact 0/1 knapsack.
//!
//! Maximizes Σ benefit subject to Σ cost ≤ budget. Items are indivisible.
//!
//! # Algorithm
//!
//! The selection is driven by an oracle giving the best benefit reachable
//! from a suffix of the candidates within a capacity. When every selectable
//! cost is integral the oracle is a suffix DP table over capacity in units
//! of the costs' gcd, which for uniform strategy costs has only
//! `budget / cost` columns. Otherwise it is a branch-and-bound search
//! pruned by the fractional relaxation. Costs need not be integral.
//!
//! # Tie-break
//!
//! When several subsets reach the optimal benefit, the selection is built by
//! walking candidates in input order and taking candidate `i` whenever an
//! optimal selection still exists that contains it together with every
//! candidate already taken. The result is the optimal subset whose inclusion
//! vector is lexicographically greatest, i.e. earlier candidates win.
//!
//! Candidates with non-positive benefit are never selected, and neither is
//! any candidate whose cost alone exceeds the budget.

use tracing::{debug, warn};

use precog_contracts::{
    error::{CoordinationError, PrecogResult},
    roi::{OptimizationResult, OptimizationStatus, RoiCalculation},
};

/// Benefits within this relative distance are treated as equal.
const RELATIVE_TOLERANCE: f64 = 1e-9;

fn tolerance(value: f64) -> f64 {
    RELATIVE_TOLERANCE * value.abs().max(1.0)
}

#[derive(Debug, Clone, Copy)]
struct Item {
    cost: f64,
    benefit: f64,
    eligible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceAllocationOptimizer {
    budget: f64,
}

impl ResourceAllocationOptimizer {
    pub fn new(budget: f64) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Select the benefit-maximizing subset of `candidates` within budget.
    ///
    /// # Errors
    ///
    /// `InfeasibleOptimization` if the budget is negative or non-finite, or
    /// if any candidate has a negative or non-finite cost or a non-finite
    /// benefit. An empty selection is not an error.
    pub fn optimize(&self, candidates: &[RoiCalculation]) -> PrecogResult<OptimizationResult> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(CoordinationError::InfeasibleOptimization {
                reason: format!("budget must be a non-negative amount, got {}", self.budget),
            });
        }

        for (idx, c) in candidates.iter().enumerate() {
            if !c.cost.is_finite() || c.cost < 0.0 {
                return Err(CoordinationError::InfeasibleOptimization {
                    reason: format!(
                        "candidate {} ({} from '{}') has invalid cost {}",
                        idx, c.strategy, c.agent, c.cost
                    ),
                });
            }
            if !c.benefit.is_finite() {
                return Err(CoordinationError::InfeasibleOptimization {
                    reason: format!(
                        "candidate {} ({} from '{}') has invalid benefit {}",
                        idx, c.strategy, c.agent, c.benefit
                    ),
                });
            }
        }

        if candidates.is_empty() {
            debug!(budget = self.budget, "no candidates to optimize");
            return Ok(OptimizationResult::empty(self.budget, OptimizationStatus::NoCandidates));
        }

        let items: Vec<Item> = candidates
            .iter()
            .map(|c| Item {
                cost: c.cost,
                benefit: c.benefit,
                eligible: c.benefit > 0.0 && c.cost <= self.budget,
            })
            .collect();

        for (idx, (item, c)) in items.iter().zip(candidates).enumerate() {
            if !item.eligible && c.cost > self.budget {
                warn!(
                    candidate = idx,
                    agent = %c.agent,
                    cost = c.cost,
                    budget = self.budget,
                    "candidate cost exceeds the whole budget, never selectable"
                );
            }
        }

        let selected_indices = select(&items, self.budget);

        let selected: Vec<RoiCalculation> =
            selected_indices.iter().map(|&i| candidates[i].clone()).collect();
        let total_cost: f64 = selected.iter().map(|c| c.cost).sum();
        let total_benefit: f64 = selected.iter().map(|c| c.benefit).sum();

        if total_cost > self.budget {
            return Err(CoordinationError::InfeasibleOptimization {
                reason: format!(
                    "selection cost {} exceeds budget {}",
                    total_cost, self.budget
                ),
            });
        }

        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            total_cost,
            total_benefit,
            "optimization complete"
        );

        Ok(OptimizationResult {
            selected,
            selected_indices,
            total_cost,
            total_benefit,
            budget: self.budget,
            status: OptimizationStatus::Optimal,
        })
    }
}

/// Indices of the optimal selection under the documented tie-break.
fn select(items: &[Item], budget: f64) -> Vec<usize> {
    let oracle = Oracle::build(items, budget);

    let mut needed = oracle.best(0, budget);
    let mut remaining = budget;
    let mut chosen = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if !item.eligible || item.cost > remaining {
            continue;
        }
        let with_item = item.benefit + oracle.best(i + 1, remaining - item.cost);
        if with_item >= needed - tolerance(needed) {
            chosen.push(i);
            remaining -= item.cost;
            needed -= item.benefit;
        }
    }
    chosen
}

/// Answers "best benefit from `items[from..]` within `capacity`".
enum Oracle<'a> {
    Buckets(BucketTable),
    Search(&'a [Item]),
}

impl<'a> Oracle<'a> {
    fn build(items: &'a [Item], budget: f64) -> Self {
        match BucketTable::build(items, budget) {
            Some(table) => Oracle::Buckets(table),
            None => {
                debug!(items = items.len(), "costs not bucketable, using branch and bound");
                Oracle::Search(items)
            }
        }
    }

    fn best(&self, from: usize, capacity: f64) -> f64 {
        match self {
            Oracle::Buckets(table) => table.best(from, capacity),
            Oracle::Search(items) => BranchAndBound::solve(&items[from..], capacity),
        }
    }
}

/// Largest integral cost handled exactly by `f64`.
const MAX_EXACT_COST: f64 = 9_007_199_254_740_992.0;

/// Upper bound on `(n + 1) * (buckets + 1)` for the bucket table.
const MAX_TABLE_CELLS: u64 = 1 << 22;

/// Suffix DP over capacity measured in units of the gcd of all eligible
/// costs. Only built when every eligible cost is integral and the table is
/// small; the uniform per-strategy cost always qualifies.
struct BucketTable {
    unit: f64,
    buckets: usize,
    /// Row `i` holds the best benefit of `items[i..]` for each bucket count.
    best: Vec<Vec<f64>>,
}

impl BucketTable {
    fn build(items: &[Item], budget: f64) -> Option<Self> {
        let mut unit: u64 = 0;
        let mut total: u64 = 0;
        for item in items.iter().filter(|it| it.eligible) {
            if item.cost.fract() != 0.0 || item.cost > MAX_EXACT_COST {
                return None;
            }
            let cost = item.cost as u64;
            unit = gcd(unit, cost);
            total = total.saturating_add(cost);
        }
        if unit == 0 {
            return None;
        }

        let capacity = total.min(budget.floor() as u64);
        let buckets = capacity / unit;
        let cells = (items.len() as u64 + 1).saturating_mul(buckets + 1);
        if cells > MAX_TABLE_CELLS {
            return None;
        }

        let buckets = buckets as usize;
        let n = items.len();
        let mut best = vec![vec![0.0_f64; buckets + 1]; n + 1];
        for i in (0..n).rev() {
            let item = items[i];
            let (head, tail) = best.split_at_mut(i + 1);
            let (row, next) = (&mut head[i], &tail[0]);
            row.copy_from_slice(next);
            if !item.eligible {
                continue;
            }
            let weight = (item.cost as u64 / unit) as usize;
            for w in weight..=buckets {
                let take = next[w - weight] + item.benefit;
                if take > row[w] {
                    row[w] = take;
                }
            }
        }

        Some(Self {
            unit: unit as f64,
            buckets,
            best,
        })
    }

    fn best(&self, from: usize, capacity: f64) -> f64 {
        let w = ((capacity / self.unit).floor() as usize).min(self.buckets);
        self.best[from][w]
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Depth-first search bounded by the fractional (LP) relaxation.
///
/// Items are visited in descending benefit/cost order, larger costs first
/// among equal ratios, so the first leaf is the greedy fill and any subtree
/// whose relaxation cannot beat the incumbent is cut.
struct BranchAndBound {
    items: Vec<Item>,
    best: f64,
}

impl BranchAndBound {
    fn solve(items: &[Item], capacity: f64) -> f64 {
        let mut items: Vec<Item> = items
            .iter()
            .copied()
            .filter(|it| it.eligible && it.cost <= capacity)
            .collect();
        items.sort_by(|a, b| ratio(b).total_cmp(&ratio(a)).then(b.cost.total_cmp(&a.cost)));

        let mut search = Self { items, best: 0.0 };
        search.descend(0, capacity, 0.0);
        search.best
    }

    fn descend(&mut self, k: usize, capacity: f64, value: f64) {
        if value > self.best {
            self.best = value;
        }
        if k == self.items.len() {
            return;
        }
        if value + self.relaxation(k, capacity) <= self.best + tolerance(self.best) {
            return;
        }
        let item = self.items[k];
        if item.cost <= capacity {
            self.descend(k + 1, capacity - item.cost, value + item.benefit);
        }
        self.descend(k + 1, capacity, value);
    }

    /// Fractional knapsack over `items[k..]`.
    fn relaxation(&self, k: usize, mut capacity: f64) -> f64 {
        let mut bound = 0.0;
        for item in &self.items[k..] {
            if item.cost <= capacity {
                capacity -= item.cost;
                bound += item.benefit;
            } else {
                bound += item.benefit * capacity / item.cost;
                break;
            }
        }
        bound
    }
}

fn ratio(item: &Item) -> f64 {
    if item.cost > 0.0 {
        item.benefit / item.cost
    } else {
        f64::INFINITY
    }
}
