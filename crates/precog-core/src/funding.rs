//! The funding simulator: an injectable table of funding opportunities.

use precog_contracts::{
    error::PrecogResult,
    roi::{FundingOpportunity, FundingSummary},
};

use crate::traits::FundingSource;

/// A fixed funding table.
///
/// Build from configuration or test data; an empty table is valid and yields
/// a multiplier of 1.0.
#[derive(Debug, Clone, Default)]
pub struct FundingSimulator {
    opportunities: Vec<FundingOpportunity>,
}

impl FundingSimulator {
    pub fn new(opportunities: Vec<FundingOpportunity>) -> Self {
        Self { opportunities }
    }

    pub fn opportunities(&self) -> &[FundingOpportunity] {
        &self.opportunities
    }

    pub fn total_potential_funding(&self) -> f64 {
        self.opportunities.iter().map(|o| o.amount).sum()
    }

    pub fn average_roi_multiplier(&self) -> f64 {
        average_multiplier(&self.opportunities)
    }

    pub fn summary(&self) -> FundingSummary {
        summarize(self.opportunities.clone())
    }
}

impl FundingSource for FundingSimulator {
    fn opportunities(&self) -> PrecogResult<Vec<FundingOpportunity>> {
        Ok(self.opportunities.clone())
    }
}

/// Mean ROI multiplier across `opportunities`, or 1.0 for none.
pub fn average_multiplier(opportunities: &[FundingOpportunity]) -> f64 {
    if opportunities.is_empty() {
        return 1.0;
    }
    let sum: f64 = opportunities.iter().map(|o| o.roi_multiplier).sum();
    sum / opportunities.len() as f64
}

/// Summarize whatever a `FundingSource` returned.
pub fn summarize(opportunities: Vec<FundingOpportunity>) -> FundingSummary {
    let total_potential_funding = opportunities.iter().map(|o| o.amount).sum();
    let average_roi_multiplier = average_multiplier(&opportunities);
    FundingSummary {
        opportunities,
        total_potential_funding,
        average_roi_multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, amount: f64, multiplier: f64) -> FundingOpportunity {
        FundingOpportunity {
            program: name.to_string(),
            amount,
            probability: 0.7,
            roi_multiplier: multiplier,
            eligibility: vec!["housing_development".to_string()],
            deadline: "2024-12-31".to_string(),
        }
    }

    #[test]
    fn empty_table_yields_unit_multiplier() {
        let sim = FundingSimulator::default();
        assert_eq!(sim.average_roi_multiplier(), 1.0);
        assert_eq!(sim.total_potential_funding(), 0.0);
        assert!(sim.summary().opportunities.is_empty());
    }

    #[test]
    fn summary_sums_amounts_and_averages_multipliers() {
        let sim = FundingSimulator::new(vec![
            program("HUD Community Development Block Grant", 15_000_000.0, 2.5),
            program("DOT Infrastructure Investment", 25_000_000.0, 3.0),
            program("HHS Social Services Block Grant", 8_000_000.0, 2.8),
        ]);

        let summary = sim.summary();
        assert_eq!(summary.total_potential_funding, 48_000_000.0);
        assert!((summary.average_roi_multiplier - 2.766_666_666_666_667).abs() < 1e-12);
        assert_eq!(summary.opportunities.len(), 3);
    }

    #[test]
    fn expected_amount_weights_by_probability() {
        let p = program("DOT Infrastructure Investment", 25_000_000.0, 3.0);
        assert_eq!(p.expected_amount(), 17_500_000.0);
    }
}
