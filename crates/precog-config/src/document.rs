//! Configuration document schema.
//!
//! A `ConfigDocument` is deserialized from TOML. Every section is optional;
//! a missing `[coordination]` table yields the built-in constants, missing
//! `[agents.*]` tables leave thresholds to the agents' own defaults, and a
//! missing `[[funding]]` array means no funding programs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use precog_contracts::{coordination::CoordinationSettings, roi::FundingOpportunity};

/// Per-agent overrides.
///
/// Example in TOML:
/// ```toml
/// [agents.street-precog]
/// threshold = 0.75
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    /// Confidence threshold in [0, 1].
    pub threshold: f64,
}

/// The top-level structure deserialized from a TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    #[serde(default)]
    pub coordination: CoordinationSettings,

    /// Keyed by agent identity.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentSection>,

    /// Funding programs, in declaration order.
    #[serde(default)]
    pub funding: Vec<FundingOpportunity>,
}

impl ConfigDocument {
    /// Every constraint violation in the document, in a stable order.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let c = &self.coordination;

        if !c.total_budget.is_finite() || c.total_budget < 0.0 {
            out.push(format!(
                "coordination.total_budget must be finite and >= 0, got {}",
                c.total_budget
            ));
        }
        if !c.base_strategy_cost.is_finite() || c.base_strategy_cost <= 0.0 {
            out.push(format!(
                "coordination.base_strategy_cost must be finite and > 0, got {}",
                c.base_strategy_cost
            ));
        }
        if !c.base_strategy_benefit.is_finite() || c.base_strategy_benefit < 0.0 {
            out.push(format!(
                "coordination.base_strategy_benefit must be finite and >= 0, got {}",
                c.base_strategy_benefit
            ));
        }
        if c.agent_timeout_ms == Some(0) {
            out.push("coordination.agent_timeout_ms must be positive when set".to_string());
        }

        for (id, agent) in &self.agents {
            if !unit_interval(agent.threshold) {
                out.push(format!(
                    "agents.{}.threshold must be in [0, 1], got {}",
                    id, agent.threshold
                ));
            }
        }

        for (i, program) in self.funding.iter().enumerate() {
            let label = if program.program.trim().is_empty() {
                out.push(format!("funding[{}].program must not be empty", i));
                format!("funding[{}]", i)
            } else {
                format!("funding '{}'", program.program)
            };
            if !program.amount.is_finite() || program.amount < 0.0 {
                out.push(format!("{}: amount must be finite and >= 0, got {}", label, program.amount));
            }
            if !unit_interval(program.probability) {
                out.push(format!(
                    "{}: probability must be in [0, 1], got {}",
                    label, program.probability
                ));
            }
            if !program.roi_multiplier.is_finite() || program.roi_multiplier <= 0.0 {
                out.push(format!(
                    "{}: roi_multiplier must be finite and > 0, got {}",
                    label, program.roi_multiplier
                ));
            }
        }

        out
    }
}

fn unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}
