//! Run-level settings and the final coordination record.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    phase::Phase,
    report::PhaseResult,
    roi::OptimizationReport,
};

/// Tunables for one coordination run.
///
/// Defaults reproduce the reference constants: a 1,000,000 budget and a
/// uniform 100,000 cost / 250,000 benefit per strategy. Missing fields
/// deserialize to those defaults; unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinationSettings {
    /// Monetary budget for the optimizer.
    pub total_budget: f64,
    /// Cost assigned to every proposed strategy.
    pub base_strategy_cost: f64,
    /// Benefit assigned to every proposed strategy before funding.
    pub base_strategy_benefit: f64,
    /// Invoke the agents of a phase on parallel threads.
    pub parallel_agents: bool,
    /// Per-agent-call limit. `None` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_timeout_ms: Option<u64>,
}

impl CoordinationSettings {
    pub const DEFAULT_BUDGET: f64 = 1_000_000.0;
    pub const DEFAULT_STRATEGY_COST: f64 = 100_000.0;
    pub const DEFAULT_STRATEGY_BENEFIT: f64 = 250_000.0;

    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for CoordinationSettings {
    fn default() -> Self {
        Self {
            total_budget: Self::DEFAULT_BUDGET,
            base_strategy_cost: Self::DEFAULT_STRATEGY_COST,
            base_strategy_benefit: Self::DEFAULT_STRATEGY_BENEFIT,
            parallel_agents: true,
            agent_timeout_ms: None,
        }
    }
}

/// The complete record of one successful coordination run.
///
/// Only ever returned whole: an aborted run yields an error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationResult {
    pub detection: PhaseResult,
    pub prediction: PhaseResult,
    pub prevention: PhaseResult,
    pub optimization: OptimizationReport,
    pub broadcast: PhaseResult,
    /// `total_benefit / total_cost` of the selected strategies, 0 if nothing
    /// was selected.
    pub total_roi: f64,
}

impl CoordinationResult {
    /// The phases recorded in this result, in execution order.
    pub fn phases(&self) -> [Phase; 5] {
        [
            self.detection.phase,
            self.prediction.phase,
            self.prevention.phase,
            Phase::Optimize,
            self.broadcast.phase,
        ]
    }

    /// The four agent-phase results, in execution order.
    pub fn agent_phases(&self) -> [&PhaseResult; 4] {
        [&self.detection, &self.prediction, &self.prevention, &self.broadcast]
    }
}
