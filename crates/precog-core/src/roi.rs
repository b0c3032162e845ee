//! The ROI calculator: turns every proposed strategy into a cost/benefit pair.
//!
//! Cost and benefit are uniform per strategy (configuration constants), not
//! derived from strategy content. Benefit is scaled by the mean funding
//! multiplier.

use precog_contracts::{
    coordination::CoordinationSettings,
    error::{CoordinationError, PrecogResult},
    report::PhaseResult,
    roi::{FundingSummary, RoiCalculation},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiCalculator {
    base_cost: f64,
    base_benefit: f64,
}

impl RoiCalculator {
    /// Returns `ConfigError` unless `base_cost > 0` and `base_benefit >= 0`,
    /// both finite.
    pub fn new(base_cost: f64, base_benefit: f64) -> PrecogResult<Self> {
        if !base_cost.is_finite() || base_cost <= 0.0 {
            return Err(CoordinationError::ConfigError {
                reason: format!("base strategy cost must be positive, got {}", base_cost),
            });
        }
        if !base_benefit.is_finite() || base_benefit < 0.0 {
            return Err(CoordinationError::ConfigError {
                reason: format!("base strategy benefit must be non-negative, got {}", base_benefit),
            });
        }
        Ok(Self { base_cost, base_benefit })
    }

    pub fn from_settings(settings: &CoordinationSettings) -> PrecogResult<Self> {
        Self::new(settings.base_strategy_cost, settings.base_strategy_benefit)
    }

    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }

    pub fn base_benefit(&self) -> f64 {
        self.base_benefit
    }

    /// Benefit of one strategy under `funding_multiplier`.
    pub fn effective_benefit(&self, funding_multiplier: f64) -> f64 {
        self.base_benefit * funding_multiplier
    }

    /// ROI of one strategy under `funding_multiplier`.
    pub fn roi(&self, funding_multiplier: f64) -> f64 {
        self.effective_benefit(funding_multiplier) / self.base_cost
    }

    /// One calculation per `(agent, strategy)` pair of the Prevent result,
    /// in registry then proposal order. Not deduplicated by category.
    pub fn calculate(&self, prevention: &PhaseResult, funding: &FundingSummary) -> Vec<RoiCalculation> {
        let multiplier = if funding.opportunities.is_empty() {
            1.0
        } else {
            funding.average_roi_multiplier
        };
        let benefit = self.effective_benefit(multiplier);
        let roi = self.roi(multiplier);

        prevention
            .strategies()
            .map(|(agent, strategy)| RoiCalculation {
                agent: agent.clone(),
                strategy: strategy.kind.clone(),
                target: strategy.target.clone(),
                cost: self.base_cost,
                benefit,
                roi,
                funding_applied: multiplier > 1.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use precog_contracts::{
        agent::AgentId,
        phase::Phase,
        report::{AgentOutcome, AgentReport, PreventResult, Priority, Strategy},
        roi::FundingOpportunity,
    };

    use super::*;
    use crate::funding::summarize;

    fn prevention(per_agent: &[(&str, usize)]) -> PhaseResult {
        let outcomes = per_agent
            .iter()
            .map(|(id, n)| {
                let mut result = PreventResult::new(0.5);
                for i in 0..*n {
                    result = result.with_strategy(
                        Strategy::new(format!("kind-{}", i), Priority::Medium).with_target("Market St"),
                    );
                }
                AgentOutcome { agent: AgentId::new(*id), report: AgentReport::Prevent(result) }
            })
            .collect();
        PhaseResult::new(Phase::Prevent, outcomes)
    }

    fn funding(multipliers: &[f64]) -> FundingSummary {
        summarize(
            multipliers
                .iter()
                .map(|m| FundingOpportunity {
                    program: "program".to_string(),
                    amount: 1_000_000.0,
                    probability: 0.7,
                    roi_multiplier: *m,
                    eligibility: vec![],
                    deadline: "2024-10-15".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn one_calculation_per_agent_strategy_pair() {
        let calc = RoiCalculator::new(100_000.0, 250_000.0).unwrap();
        let rows = calc.calculate(&prevention(&[("a", 2), ("b", 0), ("c", 1)]), &funding(&[]));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].agent, AgentId::new("a"));
        assert_eq!(rows[1].strategy, "kind-1");
        assert_eq!(rows[2].agent, AgentId::new("c"));
        for row in &rows {
            assert_eq!(row.cost, 100_000.0);
            assert_eq!(row.benefit, 250_000.0);
            assert_eq!(row.roi, 2.5);
            assert!(!row.funding_applied);
        }
    }

    #[test]
    fn funding_multiplier_scales_benefit() {
        let calc = RoiCalculator::new(100_000.0, 250_000.0).unwrap();
        let rows = calc.calculate(&prevention(&[("a", 1)]), &funding(&[2.0, 3.0]));

        assert_eq!(rows[0].benefit, 625_000.0);
        assert_eq!(rows[0].roi, 6.25);
        assert!(rows[0].funding_applied);
    }

    #[test]
    fn multiplier_below_one_is_not_flagged_as_funding() {
        let calc = RoiCalculator::new(100_000.0, 250_000.0).unwrap();
        let rows = calc.calculate(&prevention(&[("a", 1)]), &funding(&[0.5]));
        assert!(!rows[0].funding_applied);
        assert_eq!(rows[0].roi, 1.25);
    }

    #[test]
    fn roi_strictly_increases_with_multiplier() {
        let calc = RoiCalculator::new(100_000.0, 250_000.0).unwrap();
        let multipliers = [0.5, 1.0, 1.0001, 2.5, 2.8, 3.0, 10.0];
        for pair in multipliers.windows(2) {
            assert!(
                calc.roi(pair[1]) > calc.roi(pair[0]),
                "roi({}) must exceed roi({})",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn rejects_non_positive_cost() {
        assert!(matches!(
            RoiCalculator::new(0.0, 250_000.0),
            Err(CoordinationError::ConfigError { .. })
        ));
        assert!(matches!(
            RoiCalculator::new(100_000.0, f64::NAN),
            Err(CoordinationError::ConfigError { .. })
        ));
    }
}
