//! Funding, ROI, and budget-optimization types.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// A grant-like funding program whose ROI multiplier scales strategy benefits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingOpportunity {
    pub program: String,
    /// Monetary amount offered by the program.
    pub amount: f64,
    /// Probability of approval in [0, 1].
    pub probability: f64,
    pub roi_multiplier: f64,
    /// Eligibility tags (e.g. "housing_development").
    #[serde(default)]
    pub eligibility: Vec<String>,
    /// Application deadline, ISO-8601 date.
    pub deadline: String,
}

impl FundingOpportunity {
    /// Amount weighted by the probability of approval.
    pub fn expected_amount(&self) -> f64 {
        self.amount * self.probability
    }
}

/// Snapshot of the funding table used for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSummary {
    pub opportunities: Vec<FundingOpportunity>,
    pub total_potential_funding: f64,
    /// Mean ROI multiplier; 1.0 when there are no opportunities.
    pub average_roi_multiplier: f64,
}

/// Cost/benefit assessment of one `(agent, strategy)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiCalculation {
    pub agent: AgentId,
    /// Strategy category label.
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub cost: f64,
    pub benefit: f64,
    /// `benefit / cost`.
    pub roi: f64,
    pub funding_applied: bool,
}

/// How the optimizer concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationStatus {
    /// A globally optimal selection was found (possibly empty).
    Optimal,
    /// There were no candidates to choose from.
    NoCandidates,
}

/// The budget-constrained selection of candidate strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Selected calculations, in candidate order.
    pub selected: Vec<RoiCalculation>,
    /// Positions of `selected` in the candidate list.
    pub selected_indices: Vec<usize>,
    pub total_cost: f64,
    pub total_benefit: f64,
    pub budget: f64,
    pub status: OptimizationStatus,
}

impl OptimizationResult {
    /// The empty selection for `budget`.
    pub fn empty(budget: f64, status: OptimizationStatus) -> Self {
        Self {
            selected: Vec::new(),
            selected_indices: Vec::new(),
            total_cost: 0.0,
            total_benefit: 0.0,
            budget,
            status,
        }
    }

    /// `total_benefit / total_cost`, or 0 when nothing was spent.
    pub fn roi(&self) -> f64 {
        if self.total_cost > 0.0 {
            self.total_benefit / self.total_cost
        } else {
            0.0
        }
    }
}

/// Everything produced by the Optimize phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub funding: FundingSummary,
    /// One calculation per proposed strategy, in registry then proposal order.
    pub roi_calculations: Vec<RoiCalculation>,
    pub result: OptimizationResult,
}
